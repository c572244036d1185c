#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A stateful cursor over a linked list.
///
/// Supports forward stepping plus insertion and removal at the cursor's
/// position, while holding the list exclusively.
pub mod cursor;

/// The chaining hash table.
pub mod hash_table;

/// The singly linked list the table delegates enumeration to.
pub mod linked_list;

/// Owned byte payloads and the injected storage policy that manages them.
pub mod memory;

pub mod policy;

pub use cursor::Cursor;
pub use hash_table::HashTable;
pub use linked_list::LinkedList;
pub use memory::Blob;
pub use memory::HeapMemory;
pub use memory::Memory;
