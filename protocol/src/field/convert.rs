use core::fmt::Display;

use crate::frame::Frame;

pub struct TypedField<const N: usize, T>(pub T);

impl<const N: usize, T: ValueType> IsField for TypedField<N, T> {
    type Value = T;
    const OFFSET: usize = N;

    fn get(frame: &Frame) -> Result<T, T::Err> {
        T::try_from_raw(frame.get(N))
    }

    fn set(frame: &mut Frame, value: T) {
        frame.set(N, value.to_raw());
    }
}

pub trait IsField {
    type Value: ValueType;
    const OFFSET: usize;
    fn get(frame: &Frame) -> Result<Self::Value, <Self::Value as ValueType>::Err>;
    fn set(frame: &mut Frame, value: Self::Value);

    fn raw(frame: &Frame) -> u8 {
        frame.get(Self::OFFSET)
    }
}

/// A value carried in a single byte of the frame
pub trait ValueType: Display + Sized + Copy {
    type Err: Display + Sized;

    fn try_from_raw(raw: u8) -> Result<Self, Self::Err>;
    fn to_raw(&self) -> u8;
}
