#[macro_export]
macro_rules! ok_or_continue {
    ( $e:expr ) => {
        match $e {
            Ok(value) => value,
            Err(_e) => {
                continue;
            }
        }
    };
}


#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Array2d<T: Default + Copy> {
    width: usize,
    height: usize,
    vec: Vec<T>,
}

impl<T: Default + Copy> Array2d<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            vec: vec![T::default(); width * height],
        }
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// `None` outside the array
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        self.offset(x, y).map(|i| self.vec[i])
    }

    /// `None` if the position is outside the array, which is left untouched
    pub fn set(&mut self, x: usize, y: usize, value: T) -> Option<()> {
        let i = self.offset(x, y)?;
        self.vec[i] = value;
        Some(())
    }

    pub fn fill(&mut self, value: T) {
        for cell in self.vec.iter_mut() {
            *cell = value;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array2d_is_row_major_and_bounded() {
        let mut array = Array2d::<u8>::new(3, 2);
        assert_eq!(array.set(2, 1, 7), Some(()));
        assert_eq!(array.get(2, 1), Some(7));
        assert_eq!(array.get(1, 2), None);
        assert_eq!(array.set(3, 0, 1), None);
        assert_eq!(array.get(0, 0), Some(0));

        array.fill(4);
        assert_eq!(array.get(0, 1), Some(4));
        assert_eq!((array.width(), array.height()), (3, 2));
    }
}
