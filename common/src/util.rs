use core::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("mask cannot be larger than 32 or smaller than 1 bit (got {0})")]
    Width(u32),
    #[error("mask position cannot be larger than 31 or smaller than 0 (got {0})")]
    Position(u32),
}

/// Contiguous mask of `width` low-order bits.
#[inline(always)]
pub const fn mask_for(width: u32) -> Result<u32, FieldError> {
    if width < 1 || width > 32 {
        return Err(FieldError::Width(width));
    }

    // u64 so that a full 32 bit mask doesn't overflow the shift
    Ok(((1u64 << width) - 1) as u32)
}

/// `mask_for(width)` moved up to start at bit `position`.
///
/// Bits shifted past bit 31 are dropped, same as any other u32 shift.
#[inline(always)]
pub const fn field_mask(width: u32, position: u32) -> Result<u32, FieldError> {
    let mask = match mask_for(width) {
        Ok(mask) => mask,
        Err(err) => return Err(err),
    };

    if position > 31 {
        return Err(FieldError::Position(position));
    }

    Ok(mask << position)
}

/// Pulls the field selected by `mask` down to bit 0.
///
/// Total over its inputs: a position past the end of the word yields 0.
#[inline(always)]
pub const fn extract(raw: u32, mask: u32, position: u32) -> u32 {
    match (raw & mask).checked_shr(position) {
        Some(value) => value,
        None => 0,
    }
}

/// A named bit range within a 32 bit word.
///
/// Layouts are built in const context, so an out-of-range field is a compile error
/// rather than something to check at runtime.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Field {
    width: u32,
    position: u32,
    mask: u32,
}

impl Field {
    pub const fn new(width: u32, position: u32) -> Field {
        match field_mask(width, position) {
            Ok(mask) => Field { width, position, mask },
            Err(FieldError::Width(_)) => panic!("field width must be within 1..=32 bits"),
            Err(FieldError::Position(_)) => panic!("field position must be within 0..=31"),
        }
    }

    /// The `width` most significant bits of the word.
    pub const fn top(width: u32) -> Field {
        Field::new(width, 32 - width)
    }

    /// The `width` bits directly below this field.
    pub const fn next(self, width: u32) -> Field {
        Field::new(width, self.position - width)
    }

    #[inline(always)]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub const fn position(&self) -> u32 {
        self.position
    }

    #[inline(always)]
    pub const fn mask(&self) -> u32 {
        self.mask
    }

    #[inline(always)]
    pub const fn extract(&self, raw: u32) -> u32 {
        extract(raw, self.mask, self.position)
    }

    /// Drops any bits of `value` that don't fit in this field.
    #[inline(always)]
    pub const fn truncate(&self, value: u32) -> u32 {
        value & (self.mask >> self.position)
    }

    /// Replaces this field in `raw` with `value`, truncated to the field width.
    #[inline(always)]
    pub const fn insert(&self, raw: u32, value: u32) -> u32 {
        (raw & !self.mask) | ((value << self.position) & self.mask)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}@{}, {:#010x})", self.width, self.position, self.mask)
    }
}
