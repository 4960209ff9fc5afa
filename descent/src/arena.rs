use std::{
    any::Any,
    cell::{Cell, OnceCell, RefCell},
    marker::PhantomData,
    rc::{Rc, Weak},
};

struct Entry {
    value: OnceCell<Rc<dyn Any>>,
    rendering: Cell<bool>,
}

/// Owner of the parsers behind grammar handles.
///
/// Handles only keep a weak reference to their arena, so a rule that refers to
/// itself does not form a reference cycle. The arena must outlive every parse
/// run that uses its handles.
pub struct Arena {
    entries: RefCell<Vec<Entry>>,
}

impl Arena {
    pub fn new() -> Rc<Self> {
        Rc::new(Arena {
            entries: RefCell::new(Vec::new()),
        })
    }

    pub fn alloc<P>(self: &Rc<Self>) -> Slot<P> {
        let index = {
            let mut entries = self.entries.borrow_mut();
            entries.push(Entry {
                value: OnceCell::new(),
                rendering: Cell::new(false),
            });
            entries.len() - 1
        };

        Slot {
            arena: Rc::downgrade(self),
            index,
            _phantom: PhantomData,
        }
    }
}

pub struct Slot<P> {
    arena: Weak<Arena>,
    index: usize,
    _phantom: PhantomData<P>,
}

impl<P> Clone for Slot<P> {
    fn clone(&self) -> Self {
        Slot {
            arena: self.arena.clone(),
            index: self.index,
            _phantom: PhantomData,
        }
    }
}

impl<P: 'static> Slot<P> {
    /// # Panics
    /// Panics if the slot is already occupied or its arena has been dropped.
    pub fn store(&self, value: P) {
        let Some(arena) = self.arena.upgrade() else {
            panic!("grammar handle defined after its arena was dropped");
        };
        let entries = arena.entries.borrow();
        if entries[self.index].value.set(Rc::new(value)).is_err() {
            panic!("grammar handle defined twice");
        }
    }

    /// The stored value, or `None` while the slot is empty.
    pub fn get(&self) -> Option<Rc<P>> {
        let arena = self.arena.upgrade()?;
        let value = arena.entries.borrow()[self.index].value.get()?.clone();
        value.downcast().ok()
    }

    /// Mark the slot as being rendered. Returns `false` if it already was,
    /// which means the rendering has gone round a cycle.
    pub(crate) fn enter(&self) -> bool {
        self.arena.upgrade().is_some_and(|arena| {
            !arena.entries.borrow()[self.index].rendering.replace(true)
        })
    }

    pub(crate) fn leave(&self) {
        if let Some(arena) = self.arena.upgrade() {
            arena.entries.borrow()[self.index].rendering.set(false);
        }
    }
}
