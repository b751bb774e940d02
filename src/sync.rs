#[cfg(feature = "loom")]
mod imp {
    pub(crate) use loom::{
        sync::{
            Condvar, Mutex, MutexGuard,
            atomic::{AtomicU8, AtomicUsize, Ordering},
        },
        thread::JoinHandle,
    };
    pub(crate) use std::sync::{Arc, Weak};

    /// `loom` threads carry neither names nor stack sizes, and spawning never
    /// fails inside a model.
    pub(crate) fn spawn<F, T>(
        _name: String,
        _stack_size: Option<usize>,
        f: F,
    ) -> std::io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Ok(loom::thread::spawn(f))
    }
}

#[cfg(not(feature = "loom"))]
mod imp {
    pub(crate) use std::{
        sync::{
            Arc, Condvar, Mutex, MutexGuard, Weak,
            atomic::{AtomicU8, AtomicUsize, Ordering},
        },
        thread::JoinHandle,
    };

    pub(crate) fn spawn<F, T>(
        name: String,
        stack_size: Option<usize>,
        f: F,
    ) -> std::io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut builder = std::thread::Builder::new().name(name);
        if let Some(bytes) = stack_size {
            builder = builder.stack_size(bytes);
        }
        builder.spawn(f)
    }
}

pub(crate) use imp::*;
