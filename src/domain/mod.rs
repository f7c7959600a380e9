//! Domain layer: entries, events, dropdown vocabularies and their
//! identifiers.
//!
//! Every entity has a fixed schema. Storage backends convert to and from
//! these types; nothing above the persistence layer handles untyped rows.

pub mod dropdown;
pub mod entry;
pub mod entry_id;
pub mod event;
pub mod timestamp;

pub use dropdown::{Category, DropdownKey, DropdownValue};
pub use entry::{Entry, EntryPatch, NewEntry};
pub use entry_id::{EntryId, EntryIdGenerator};
pub use event::{Event, EventDraft, NewEvent};
