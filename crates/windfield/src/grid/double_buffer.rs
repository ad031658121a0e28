/// Two copies of the same storage, one "current" and one "previous".
///
/// A stage that derives a new state from the old one calls [`DoubleBuffer::swap`]
/// once, then reads [`DoubleBuffer::previous`] and writes [`DoubleBuffer::current`]
/// (or both at once through [`DoubleBuffer::split_mut`]).
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    copies: [T; 2],
    current: usize,
}

/// Identifies one of the two copies independent of which one is current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferCopy {
    Current,
    Previous,
}

impl<T> DoubleBuffer<T> {
    pub fn new(alpha: T, beta: T) -> Self {
        Self {
            copies: [alpha, beta],
            current: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.copies[self.current]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.copies[self.current]
    }

    pub fn previous(&self) -> &T {
        &self.copies[1 - self.current]
    }

    pub fn previous_mut(&mut self) -> &mut T {
        &mut self.copies[1 - self.current]
    }

    pub fn get(&self, copy: BufferCopy) -> &T {
        match copy {
            BufferCopy::Current => self.current(),
            BufferCopy::Previous => self.previous(),
        }
    }

    pub fn get_mut(&mut self, copy: BufferCopy) -> &mut T {
        match copy {
            BufferCopy::Current => self.current_mut(),
            BufferCopy::Previous => self.previous_mut(),
        }
    }

    /// Flip which copy is current
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    /// Borrow (previous, current) at the same time
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let (alpha, beta) = self.copies.split_at_mut(1);
        if self.current == 0 {
            (&beta[0], &mut alpha[0])
        } else {
            (&alpha[0], &mut beta[0])
        }
    }

    /// True while the first allocated copy ("alpha") is current
    pub fn alpha_is_current(&self) -> bool {
        self.current == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_flips_current_and_previous() {
        let mut buffer = DoubleBuffer::new("alpha", "beta");
        assert_eq!(*buffer.current(), "alpha");
        assert_eq!(*buffer.previous(), "beta");

        buffer.swap();
        assert_eq!(*buffer.current(), "beta");
        assert_eq!(*buffer.previous(), "alpha");
        assert!(!buffer.alpha_is_current());
    }

    #[test]
    fn test_split_mut_writes_current_only() {
        let mut buffer = DoubleBuffer::new(vec![1, 2], vec![0, 0]);
        buffer.swap();
        {
            let (prev, cur) = buffer.split_mut();
            for (dst, src) in cur.iter_mut().zip(prev.iter()) {
                *dst = src * 10;
            }
        }
        assert_eq!(buffer.current(), &vec![10, 20]);
        assert_eq!(buffer.previous(), &vec![1, 2]);
    }
}
