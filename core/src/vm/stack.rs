use crate::evaluator::ExecutionError;

/// A bounds-checked operand stack over a caller-provided buffer.
///
/// Used by the checked interpreter. Every push and pop is validated and the
/// deepest point reached is recorded.
///
/// # Examples
///
/// ```ignore
/// let mut buffer = [0; 4];
/// let mut stack = Stack::new(&mut buffer);
/// stack.push(42, 0)?;
/// stack.push(17, 0)?;
/// assert_eq!(stack.pop(0)?, 17);
/// assert_eq!(stack.high_water(), 2);
/// ```
pub struct Stack<'s> {
    slots: &'s mut [i32],
    len: usize,
    high_water: usize,
}

impl<'s> Stack<'s> {
    pub fn new(slots: &'s mut [i32]) -> Self {
        Self {
            slots,
            len: 0,
            high_water: 0,
        }
    }

    /// Pushes a value; `offset` is the address of the executing instruction.
    #[inline]
    pub fn push(&mut self, value: i32, offset: usize) -> Result<(), ExecutionError> {
        let capacity = self.slots.len();
        let slot = self
            .slots
            .get_mut(self.len)
            .ok_or(ExecutionError::StackOverflow { offset, capacity })?;
        *slot = value;
        self.len += 1;
        self.high_water = self.high_water.max(self.len);
        Ok(())
    }

    #[inline]
    pub fn pop(&mut self, offset: usize) -> Result<i32, ExecutionError> {
        if self.len == 0 {
            return Err(ExecutionError::StackUnderflow { offset });
        }
        self.len -= 1;
        Ok(self.slots[self.len])
    }

    /// Mutable reference to the top value.
    #[inline]
    pub fn peek_mut(&mut self, offset: usize) -> Result<&mut i32, ExecutionError> {
        match self.len.checked_sub(1) {
            Some(top) => Ok(&mut self.slots[top]),
            None => Err(ExecutionError::StackUnderflow { offset }),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// The largest number of values held at once.
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}
