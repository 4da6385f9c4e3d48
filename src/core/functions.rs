//! Function combinators: curry, once, memoize.
//!
//! Debouncing and delayed flushing live in [`crate::debounce`] because they
//! need a [`crate::scheduler::Scheduler`].

use serde::Serialize;
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::{Error, Result};

pub fn identity<T>(value: T) -> T {
    value
}

pub fn noop<T>(_: T) {}

// ============================================================================
// Curry
// ============================================================================

/// A function of `arity` arguments that accepts them a few at a time.
pub struct Curried<A, R> {
    arity: usize,
    args: Vec<A>,
    f: Rc<dyn Fn(Vec<A>) -> R>,
}

impl<A: Clone, R> Clone for Curried<A, R> {
    fn clone(&self) -> Self {
        Self {
            arity: self.arity,
            args: self.args.clone(),
            f: Rc::clone(&self.f),
        }
    }
}

impl<A, R> fmt::Debug for Curried<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curried")
            .field("arity", &self.arity)
            .field("supplied", &self.args.len())
            .finish()
    }
}

/// Result of applying arguments to a [`Curried`] function.
#[derive(Debug)]
pub enum Applied<A, R> {
    Partial(Curried<A, R>),
    Done(R),
}

impl<A, R> Applied<A, R> {
    pub fn done(self) -> Option<R> {
        match self {
            Applied::Done(result) => Some(result),
            Applied::Partial(_) => None,
        }
    }

    pub fn partial(self) -> Option<Curried<A, R>> {
        match self {
            Applied::Partial(curried) => Some(curried),
            Applied::Done(_) => None,
        }
    }
}

/// Curry `f` over `arity` arguments. `f` runs once the supplied arguments reach
/// `arity`; extra arguments in the completing call are passed through.
pub fn curry<A, R, F>(arity: usize, f: F) -> Curried<A, R>
where
    F: Fn(Vec<A>) -> R + 'static,
{
    Curried {
        arity,
        args: Vec::new(),
        f: Rc::new(f),
    }
}

impl<A: Clone, R> Curried<A, R> {
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Arguments still missing before `f` runs.
    pub fn remaining(&self) -> usize {
        self.arity.saturating_sub(self.args.len())
    }

    /// Apply more arguments. `self` is left untouched so a partial can be reused.
    pub fn call<I>(&self, args: I) -> Applied<A, R>
    where
        I: IntoIterator<Item = A>,
    {
        let mut all = self.args.clone();
        all.extend(args);
        if all.len() >= self.arity {
            Applied::Done((self.f)(all))
        } else {
            Applied::Partial(Curried {
                arity: self.arity,
                args: all,
                f: Rc::clone(&self.f),
            })
        }
    }
}

// ============================================================================
// Once
// ============================================================================

/// Runs the wrapped function on the first call only.
pub struct Once<F, R> {
    f: Cell<Option<F>>,
    result: OnceCell<R>,
}

pub fn once<F, R>(f: F) -> Once<F, R> {
    Once {
        f: Cell::new(Some(f)),
        result: OnceCell::new(),
    }
}

impl<F, R> Once<F, R> {
    /// The first call's result, whatever `args` later calls pass. `None` only
    /// when called again from inside the wrapped function itself.
    pub fn call<A>(&self, args: A) -> Option<&R>
    where
        F: FnOnce(A) -> R,
    {
        if let Some(result) = self.result.get() {
            return Some(result);
        }
        let f = self.f.take()?;
        let result = f(args);
        Some(self.result.get_or_init(|| result))
    }

    pub fn called(&self) -> bool {
        self.result.get().is_some()
    }
}

impl<F, R: fmt::Debug> fmt::Debug for Once<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Once").field("result", &self.result.get()).finish()
    }
}

// ============================================================================
// Memoize
// ============================================================================

pub type KeyFn<A> = fn(&A) -> Result<String>;

/// Caches results by a string key derived from the arguments.
pub struct Memoized<A, R, F, K = KeyFn<A>> {
    f: F,
    key: K,
    cache: RefCell<HashMap<String, R>>,
    _args: PhantomData<fn(&A)>,
}

/// Default key: the arguments serialized as JSON.
pub fn json_key<A: Serialize>(args: &A) -> Result<String> {
    serde_json::to_string(args)
        .map_err(|e| Error::internal_json(e.to_string(), Some("memoize key".to_string())))
}

pub fn memoize<A, R, F>(f: F) -> Memoized<A, R, F>
where
    A: Serialize,
    F: Fn(&A) -> R,
{
    memoize_with(f, json_key::<A> as KeyFn<A>)
}

pub fn memoize_with<A, R, F, K>(f: F, key: K) -> Memoized<A, R, F, K>
where
    F: Fn(&A) -> R,
    K: Fn(&A) -> Result<String>,
{
    Memoized {
        f,
        key,
        cache: RefCell::new(HashMap::new()),
        _args: PhantomData,
    }
}

impl<A, R, F, K> Memoized<A, R, F, K>
where
    R: Clone,
    F: Fn(&A) -> R,
    K: Fn(&A) -> Result<String>,
{
    pub fn call(&self, args: &A) -> Result<R> {
        let key = (self.key)(args)?;
        let cached = self.cache.borrow().get(&key).cloned();
        if let Some(result) = cached {
            return Ok(result);
        }
        let result = (self.f)(args);
        self.cache.borrow_mut().insert(key, result.clone());
        Ok(result)
    }

    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(args: Vec<i32>) -> i32 {
        args.iter().sum()
    }

    #[test]
    fn curry_accepts_arguments_in_any_grouping() {
        let curried = curry(3, sum);
        let one_at_a_time = curried
            .call([3])
            .partial()
            .unwrap()
            .call([5])
            .partial()
            .unwrap()
            .call([2])
            .done();
        assert_eq!(one_at_a_time, Some(10));
        assert_eq!(
            curried.call([3, 5]).partial().unwrap().call([2]).done(),
            Some(10)
        );
        assert_eq!(
            curried.call([3]).partial().unwrap().call([5, 2]).done(),
            Some(10)
        );
    }

    #[test]
    fn curry_partial_is_reusable() {
        let add_to_ten = curry(2, sum).call([10]).partial().unwrap();
        assert_eq!(add_to_ten.remaining(), 1);
        assert_eq!(add_to_ten.call([1]).done(), Some(11));
        assert_eq!(add_to_ten.call([2]).done(), Some(12));
    }

    #[test]
    fn curry_passes_extra_arguments_through() {
        let count = curry(2, |args: Vec<i32>| args.len());
        assert_eq!(count.call([1, 2, 3]).done(), Some(3));
        assert_eq!(curry(0, |args: Vec<i32>| args.len()).call([]).done(), Some(0));
    }

    #[test]
    fn noop_and_identity() {
        [1, 2, 3].into_iter().for_each(noop);
        assert_eq!(identity("x"), "x");
    }

    #[test]
    fn once_caches_the_first_result() {
        let calls = Cell::new(0);
        let seen = Cell::new(0);
        let first = once(|arg: i32| {
            calls.set(calls.get() + 1);
            seen.set(arg);
            "first"
        });
        assert_eq!(first.call(1), Some(&"first"));
        assert_eq!(first.call(2), Some(&"first"));
        assert_eq!(first.call(3), Some(&"first"));
        assert_eq!(calls.get(), 1);
        assert_eq!(seen.get(), 1);
        assert!(first.called());
    }

    #[test]
    fn memoize_calls_once_per_key() {
        let calls = Cell::new(0);
        let memoized = memoize(|(a, b): &(i32, String)| {
            calls.set(calls.get() + 1);
            format!("{}{}", b, a)
        });

        let first = memoized.call(&(1, "ddd".to_string())).unwrap();
        assert_eq!(first, memoized.call(&(1, "ddd".to_string())).unwrap());
        assert_eq!(calls.get(), 1);

        let second = memoized.call(&(1, "ddd2".to_string())).unwrap();
        assert_eq!(second, memoized.call(&(1, "ddd2".to_string())).unwrap());
        assert_eq!(calls.get(), 2);
        assert_eq!(memoized.cached(), 2);
    }

    #[test]
    fn memoize_with_custom_key() {
        let calls = Cell::new(0);
        let memoized = memoize_with(
            |text: &String| {
                calls.set(calls.get() + 1);
                text.len()
            },
            |text: &String| Ok(text.to_lowercase()),
        );
        assert_eq!(memoized.call(&"ABC".to_string()).unwrap(), 3);
        assert_eq!(memoized.call(&"abc".to_string()).unwrap(), 3);
        assert_eq!(calls.get(), 1);
        memoized.clear();
        assert_eq!(memoized.cached(), 0);
    }

    #[test]
    fn memoize_key_failure_skips_the_call() {
        let calls = Cell::new(0);
        let memoized = memoize_with(
            |_: &i32| calls.set(calls.get() + 1),
            |_: &i32| Err(Error::internal_json("no key", None)),
        );
        let err = memoized.call(&1).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.json_error");
        assert_eq!(calls.get(), 0);
    }
}
