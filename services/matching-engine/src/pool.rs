//! Fixed-block object pool backing order records.
//!
//! Storage grows block by block; each block holds as many `T` slots as fit
//! in `BLOCK_SIZE` bytes, and a single free-list head threads through
//! released slots. Total growth is capped at `MAX_BLOCKS`, so memory is
//! bounded. One mutex guards all state; every critical section is O(1).
//!
//! Handles are opaque indices without `Clone`: `release` consumes the
//! handle, so a double release does not compile.

use std::marker::PhantomData;
use std::mem;
use std::sync::Mutex;
use thiserror::Error;
use types::order::Order;

/// Bytes per storage block.
pub const BLOCK_SIZE: usize = 4096;

/// Hard cap on the number of blocks a pool may allocate.
pub const MAX_BLOCKS: usize = 1024;

/// Free-list terminator.
const NIL: u32 = u32::MAX;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool exhausted: all {0} blocks in use")]
    Exhausted(usize),
}

/// Owning ticket for one pooled slot.
#[derive(Debug, PartialEq, Eq)]
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<T>,
}

struct Slot<T> {
    value: Option<T>,
    next_free: u32,
}

struct PoolState<T> {
    blocks: Vec<Vec<Slot<T>>>,
    free_head: u32,
    active: usize,
}

/// Typed fixed-block pool.
///
/// `T: Copy` keeps slot reuse trivial: values move in and out of slots by
/// bit copy, never by running user code.
pub struct Pool<T: Copy> {
    state: Mutex<PoolState<T>>,
    slots_per_block: usize,
    max_blocks: usize,
}

impl<T: Copy> Pool<T> {
    pub fn new() -> Self {
        Self::with_max_blocks(MAX_BLOCKS)
    }

    pub fn with_max_blocks(max_blocks: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                blocks: Vec::new(),
                free_head: NIL,
                active: 0,
            }),
            slots_per_block: (BLOCK_SIZE / mem::size_of::<T>()).max(1),
            max_blocks,
        }
    }

    /// Store a value, returning its handle.
    pub fn acquire(&self, value: T) -> Result<Handle<T>, PoolError> {
        let mut state = self.state.lock().expect("pool mutex poisoned");

        let index = if state.free_head != NIL {
            let index = state.free_head;
            let (block, slot) = self.locate(index);
            let next = state.blocks[block][slot].next_free;
            state.blocks[block][slot].value = Some(value);
            state.blocks[block][slot].next_free = NIL;
            state.free_head = next;
            index
        } else {
            if state
                .blocks
                .last()
                .map_or(true, |block| block.len() == self.slots_per_block)
            {
                if state.blocks.len() == self.max_blocks {
                    return Err(PoolError::Exhausted(self.max_blocks));
                }
                state.blocks.push(Vec::with_capacity(self.slots_per_block));
            }
            let block = state.blocks.len() - 1;
            let slot = state.blocks[block].len();
            state.blocks[block].push(Slot {
                value: Some(value),
                next_free: NIL,
            });
            (block * self.slots_per_block + slot) as u32
        };

        state.active += 1;
        Ok(Handle {
            index,
            _marker: PhantomData,
        })
    }

    /// Return a slot to the free list, yielding the stored value.
    pub fn release(&self, handle: Handle<T>) -> T {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        let (block, slot) = self.locate(handle.index);
        let free_head = state.free_head;
        let cell = &mut state.blocks[block][slot];
        // A live handle always points at an occupied slot.
        let value = cell.value.take().expect("released handle was live");
        cell.next_free = free_head;
        state.free_head = handle.index;
        state.active -= 1;
        value
    }

    /// Copy out the value behind a live handle.
    pub fn get(&self, handle: &Handle<T>) -> T {
        let state = self.state.lock().expect("pool mutex poisoned");
        let (block, slot) = self.locate(handle.index);
        state.blocks[block][slot]
            .value
            .expect("handle refers to an occupied slot")
    }

    pub fn active_count(&self) -> usize {
        self.state.lock().expect("pool mutex poisoned").active
    }

    pub fn block_count(&self) -> usize {
        self.state.lock().expect("pool mutex poisoned").blocks.len()
    }

    fn locate(&self, index: u32) -> (usize, usize) {
        let index = index as usize;
        (index / self.slots_per_block, index % self.slots_per_block)
    }
}

impl<T: Copy> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The pool instance shared by every session's books.
pub type OrderPool = Pool<Order>;
pub type OrderHandle = Handle<Order>;
