use crate::Encoded;
use std::ops::{IndexMut, Index};

/// Fixed size table with one slot per variant of `E`, indexed by ordinal.
pub struct EnumMap<E, T>
    where
        E: Encoded,
{
    contents: E::ArrayType<T>,
}

impl<E, T> EnumMap<E, T>
    where
        E: Encoded,
{
    /// Every slot starts out as `default`
    pub fn new(default: T) -> EnumMap<E, T>
    where
        T: Clone,
    {
        EnumMap {
            contents: E::array_from_fn(|_| default.clone())
        }
    }

    pub fn from_fn<F>(f: F) -> EnumMap<E, T>
    where
        F: FnMut(E) -> T,
    {
        EnumMap {
            contents: E::array_from_fn(f)
        }
    }

    /// Wraps an array that is already laid out by ordinal.
    ///
    /// This is the only constructor usable in const context, so it's what static tables
    /// are built with.
    pub const fn from_array(contents: E::ArrayType<T>) -> EnumMap<E, T> {
        EnumMap { contents }
    }

    pub fn len(&self) -> usize {
        E::COUNT
    }

    pub fn iter(&self) -> EnumMapIterator<'_, E, T> {
        EnumMapIterator {
            pos: 0,
            map: self,
        }
    }
}

pub struct EnumMapIterator<'a, E, T>
    where
        E: Encoded,
{
    pos: usize,
    map: &'a EnumMap<E, T>,
}

impl<'a, E, T> Iterator for EnumMapIterator<'a, E, T>
    where
        E: Encoded,
{
    type Item = (E, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = E::from_ordinal(self.pos)?;
        self.pos += 1;
        Some((id, &self.map[id]))
    }
}

impl<E, T> Index<E> for EnumMap<E, T>
    where
        E: Encoded,
{
    type Output = T;

    #[inline(always)]
    fn index(&self, id: E) -> &T {
        &self.contents.as_ref()[id.ordinal()]
    }
}

impl<E, T> IndexMut<E> for EnumMap<E, T>
    where
        E: Encoded,
{
    #[inline(always)]
    fn index_mut(&mut self, id: E) -> &mut T {
        &mut self.contents.as_mut()[id.ordinal()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, Encoded)]
    #[encoded(width = 3)]
    enum Shape {
        Point = 0b000,
        Line = 0b010,
        #[encoded(mnemonic = "tri")]
        Triangle = 0b011,
        Square = 0b111,
    }

    const SHAPES: EnumMap<Shape, u8> = EnumMap::from_array([1, 2, 3, 4]);

    #[test]
    fn ordinals_are_dense() {
        assert_eq!(Shape::COUNT, 4);
        assert_eq!(<Shape as Encoded>::WIDTH, 3);
        assert_eq!(Shape::Square.ordinal(), 3);
        assert_eq!(Shape::Square.bits(), 0b111);
        assert_eq!(Shape::from_ordinal(1), Some(Shape::Line));
        assert_eq!(Shape::from_ordinal(4), None);

        let all: Vec<Shape> = Shape::iter().collect();
        assert_eq!(all, Shape::ALL.to_vec());
    }

    #[test]
    fn bit_patterns() {
        assert_eq!(Shape::from_bits(0b011), Some(Shape::Triangle));
        assert_eq!(Shape::from_bits(0b001), None);
        assert_eq!(Shape::from_bits(0b1000), None);

        assert_eq!(Shape::Triangle.mnemonic(), "tri");
        assert_eq!(Shape::Square.mnemonic(), "square");
    }

    #[test]
    fn lookup() {
        assert_eq!(SHAPES.len(), 4);
        assert_eq!(SHAPES[Shape::Point], 1);
        assert_eq!(SHAPES[Shape::Square], 4);

        let mut sides = EnumMap::<Shape, u32>::new(0);
        sides[Shape::Line] = 1;
        sides[Shape::Triangle] = 3;
        assert_eq!(sides[Shape::Triangle], 3);
        assert_eq!(sides[Shape::Point], 0);

        let bits = EnumMap::<Shape, u32>::from_fn(|s| s.bits());
        let collected: Vec<(Shape, u32)> = bits.iter().map(|(s, b)| (s, *b)).collect();
        assert_eq!(collected[2], (Shape::Triangle, 0b011));
        assert_eq!(collected.len(), 4);
    }
}
