use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Thread-local stack of coroutines whose bodies are executing.
    ///
    /// The top entry is the coroutine whose body is presently running user
    /// code. Nested coroutines (a body driving another coroutine) stack on
    /// top of their driver. Entries are type-erased so that coroutines of
    /// every signature share the same stack.
    static STACK: RefCell<Vec<Rc<dyn Any>>> = const { RefCell::new(Vec::new()) };
}

/// Guard returned by [`enter`]; leaves the context when dropped.
///
/// Leaving on drop keeps the stack balanced even if the body panics
/// while it is being polled.
pub(crate) struct Entered {
    pushed: bool,
}

/// Enters the execution context of `coroutine` for the current thread.
///
/// The coroutine is pushed unless it is already on top of the stack.
/// It stays there until the returned guard is dropped.
pub(crate) fn enter(coroutine: Rc<dyn Any>) -> Entered {
    STACK.with(|stack| {
        let mut stack = stack.borrow_mut();

        if stack.last().is_some_and(|top| same(top, &coroutine)) {
            return Entered { pushed: false };
        }

        stack.push(coroutine);
        Entered { pushed: true }
    })
}

impl Drop for Entered {
    fn drop(&mut self) {
        if self.pushed {
            STACK.with(|stack| {
                stack.borrow_mut().pop();
            });
        }
    }
}

/// Returns the coroutine on top of the stack, if any.
pub(crate) fn current() -> Option<Rc<dyn Any>> {
    STACK.with(|stack| stack.borrow().last().cloned())
}

/// Returns `true` if `coroutine` is on top of the stack.
pub(crate) fn is_current(coroutine: &Rc<dyn Any>) -> bool {
    STACK.with(|stack| stack.borrow().last().is_some_and(|top| same(top, coroutine)))
}

/// Returns the number of nested coroutine bodies currently executing.
pub fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

fn same(a: &Rc<dyn Any>, b: &Rc<dyn Any>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_entries_unwind_in_order() {
        let outer: Rc<dyn Any> = Rc::new(1u8);
        let inner: Rc<dyn Any> = Rc::new(2u8);

        let a = enter(outer.clone());
        assert!(is_current(&outer));

        let b = enter(inner.clone());
        assert!(is_current(&inner));
        assert_eq!(depth(), 2);

        drop(b);
        assert!(is_current(&outer));

        drop(a);
        assert!(current().is_none());
    }

    #[test]
    fn reentering_the_top_does_not_push() {
        let co: Rc<dyn Any> = Rc::new(());

        let a = enter(co.clone());
        let b = enter(co.clone());
        assert_eq!(depth(), 1);

        drop(b);
        assert_eq!(depth(), 1);

        drop(a);
        assert_eq!(depth(), 0);
    }
}
