// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Column (component pool): a type-erased, alignment-respecting contiguous buffer
//! holding one archetype's worth of a single component type, in row order.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::component::ComponentInfo;

/// A resizable, type-erased byte buffer indexed by row.
///
/// Rows are appended on entity insertion and the buffer grows by doubling; `len` is kept
/// in lock-step with the owning archetype's entity vector. A dead row's bytes are dropped
/// at the point of removal (see `Archetype::remove_row`), not when the column itself is
/// dropped — see the note on `Drop` below.
pub(crate) struct Column {
    ptr: NonNull<u8>,
    elem_layout: Layout,
    drop_fn: unsafe fn(*mut u8),
    len: usize,
    cap: usize,
}

impl Column {
    pub fn new(info: ComponentInfo) -> Self {
        let elem_layout = info.layout;
        let dangling = if elem_layout.size() == 0 {
            NonNull::new(elem_layout.align() as *mut u8).unwrap()
        } else {
            NonNull::dangling()
        };
        Self {
            ptr: dangling,
            elem_layout,
            drop_fn: info.drop_fn,
            len: 0,
            cap: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    fn array_layout(&self, cap: usize) -> Layout {
        let size = self.elem_layout.size().checked_mul(cap).expect("capacity overflow");
        Layout::from_size_align(size, self.elem_layout.align()).expect("invalid layout")
    }

    fn grow(&mut self) {
        if self.elem_layout.size() == 0 {
            // ZSTs need no backing storage; only `len` tracks anything.
            self.cap = usize::MAX;
            return;
        }
        let new_cap = if self.cap == 0 { 4 } else { self.cap * 2 };
        unsafe {
            let new_layout = self.array_layout(new_cap);
            let new_ptr = if self.cap == 0 {
                alloc::alloc(new_layout)
            } else {
                let old_layout = self.array_layout(self.cap);
                alloc::realloc(self.ptr.as_ptr(), old_layout, new_layout.size())
            };
            self.ptr = NonNull::new(new_ptr).unwrap_or_else(|| alloc::handle_alloc_error(new_layout));
        }
        self.cap = new_cap;
    }

    /// Appends one uninitialized row, growing the buffer if necessary, and returns a
    /// pointer to its (uninitialized) bytes.
    pub fn push_uninit(&mut self) -> *mut u8 {
        if self.len == self.cap {
            self.grow();
        }
        let row = self.len;
        self.len += 1;
        self.row_ptr(row)
    }

    fn row_ptr(&self, row: usize) -> *mut u8 {
        if self.elem_layout.size() == 0 {
            self.ptr.as_ptr()
        } else {
            unsafe { self.ptr.as_ptr().add(row * self.elem_layout.size()) }
        }
    }

    /// Returns a pointer to an already-initialized row's bytes.
    pub fn row(&self, row: usize) -> *mut u8 {
        debug_assert!(row < self.len);
        self.row_ptr(row)
    }

    /// Drops the value stored at `row` in place. Caller must not read or drop it again.
    pub fn drop_at(&mut self, row: usize) {
        unsafe { (self.drop_fn)(self.row_ptr(row)) };
    }

    /// Copies `count` bytes of one component value from `src` column row `src_row` into
    /// `self` row `dst_row`. Both columns must hold the same component type.
    pub fn copy_from(&mut self, src: &Column, src_row: usize, dst_row: usize) {
        debug_assert_eq!(self.elem_layout, src.elem_layout);
        if self.elem_layout.size() == 0 {
            return;
        }
        unsafe {
            std::ptr::copy_nonoverlapping(
                src.row_ptr(src_row),
                self.row_ptr(dst_row),
                self.elem_layout.size(),
            );
        }
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        // Live rows are dropped by the owning Archetype's Drop impl (it alone knows
        // which rows are still alive vs. tombstoned); here we only release raw storage.
        if self.elem_layout.size() != 0 && self.cap != 0 {
            unsafe {
                alloc::dealloc(self.ptr.as_ptr(), self.array_layout(self.cap));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{id_of, info_of};

    #[test]
    fn push_and_read_back() {
        struct Marker;
        let id = id_of::<u32>().unwrap();
        let _ = id_of::<Marker>();
        let mut col = Column::new(info_of(id));
        unsafe {
            let p = col.push_uninit() as *mut u32;
            p.write(42);
            let p2 = col.push_uninit() as *mut u32;
            p2.write(7);
        }
        assert_eq!(col.len(), 2);
        unsafe {
            assert_eq!(*(col.row(0) as *const u32), 42);
            assert_eq!(*(col.row(1) as *const u32), 7);
        }
        col.drop_at(0);
        col.drop_at(1);
    }

    #[test]
    fn zero_sized_component() {
        let id = id_of::<()>().unwrap();
        let mut col = Column::new(info_of(id));
        for _ in 0..5 {
            col.push_uninit();
        }
        assert_eq!(col.len(), 5);
    }

    #[test]
    fn copy_from_preserves_value() {
        let id = id_of::<u64>().unwrap();
        let mut a = Column::new(info_of(id));
        let mut b = Column::new(info_of(id));
        unsafe {
            (a.push_uninit() as *mut u64).write(123456789);
        }
        b.push_uninit();
        b.copy_from(&a, 0, 0);
        unsafe {
            assert_eq!(*(b.row(0) as *const u64), 123456789);
        }
        a.drop_at(0);
        b.drop_at(0);
    }
}
