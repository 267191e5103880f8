use std::marker::PhantomData;

/// A closed set of bit patterns for one instruction field.
///
/// Every variant has an ordinal, its position in declaration order. Ordinals are dense,
/// unlike the bit patterns themselves, which is what lets an [`EnumMap`](crate::EnumMap)
/// hold exactly `COUNT` entries.
///
/// Normally implemented with `#[derive(Encoded)]`, which also provides `const fn`
/// versions of `ordinal`, `bits`, `from_bits` and `mnemonic` as inherent methods.
pub trait Encoded : Copy + Eq + std::fmt::Debug + 'static {
    const COUNT: usize;
    /// Width of the field, in bits
    const WIDTH: u32;

    type ArrayType<T>: AsRef<[T]> + AsMut<[T]>;

    fn ordinal(self) -> usize;
    fn from_ordinal(ordinal: usize) -> Option<Self>;

    fn bits(self) -> u32;
    /// `None` for any pattern outside the enumeration
    fn from_bits(bits: u32) -> Option<Self>;

    fn mnemonic(self) -> &'static str;

    fn array_from_fn<T>(f: impl FnMut(Self) -> T) -> Self::ArrayType<T>;

    fn iter() -> EncodedIterator<Self> {
        EncodedIterator {
            pos: 0,
            e_type: PhantomData,
        }
    }
}

pub struct EncodedIterator<E> {
    pos: usize,
    e_type: PhantomData<fn() -> E>,
}

impl<E> Iterator for EncodedIterator<E> where E: Encoded {
    type Item = E;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        let item = E::from_ordinal(self.pos)?;
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = E::COUNT.saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl<E> ExactSizeIterator for EncodedIterator<E> where E: Encoded { }
