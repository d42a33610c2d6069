//! The storable record contract.
//!
//! Instead of runtime reflection, every storable type carries a static
//! field-descriptor table: a declaration-order list of `(name, type, kind,
//! accessor)` entries built by hand (or by codegen) when the type is written.
//! Schema introspection, record serialization, and link resolution are all
//! driven by this table, so the compiled type never has to be inspected at
//! runtime.

use crate::error::DbResult;
use crate::schema::{FieldKind, FieldType};
use crate::value::FieldValue;
use std::any::Any;

/// Numeric record identifier. Zero means "not yet persisted".
pub type RecordId = u64;

/// Name of the mandatory identifier field.
pub const ID_FIELD: &str = "ID";

/// A storable record type.
///
/// Implementors provide a stable type tag (used in schema files and table
/// file names), identifier access, and the field-descriptor table. Only
/// fields listed in [`Record::descriptors`] are candidates for persistence;
/// the identifier is always persisted, listed or not.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Player {
///     id: RecordId,
///     name: String,
/// }
///
/// impl Record for Player {
///     const TYPE_TAG: &'static str = "Player";
///
///     fn id(&self) -> RecordId {
///         self.id
///     }
///
///     fn set_id(&mut self, id: RecordId) {
///         self.id = id;
///     }
///
///     fn descriptors() -> Vec<FieldDescriptor<Self>> {
///         vec![FieldDescriptor::scalar(
///             "Name",
///             FieldType::Text,
///             FieldKind::Plain,
///             |p| p.name.clone().into(),
///             |p, v| {
///                 if let FieldValue::Text(s) = v {
///                     p.name = s;
///                 }
///             },
///         )]
///     }
/// }
/// ```
pub trait Record: Default + 'static {
    /// Stable tag naming this type in schema files and table file names.
    const TYPE_TAG: &'static str;

    /// Returns the record identifier (0 if never persisted).
    fn id(&self) -> RecordId;

    /// Sets the record identifier.
    fn set_id(&mut self, id: RecordId);

    /// Returns the field-descriptor table, in declaration order.
    fn descriptors() -> Vec<FieldDescriptor<Self>>;
}

/// Accessors for one persisted field of `T`.
#[derive(Debug)]
pub enum FieldAccessor<T> {
    /// A scalar field read and written as a [`FieldValue`].
    Scalar {
        /// Reads the field value.
        get: fn(&T) -> FieldValue,
        /// Writes the field value.
        set: fn(&mut T, FieldValue),
    },
    /// A linked-reference field, persisted as a foreign-key identifier.
    Link {
        /// Type tag of the linked record type.
        target: &'static str,
        /// Reads the current foreign-key identifier (0 = unset).
        id: fn(&T) -> RecordId,
        /// Writes the foreign-key identifier.
        set_id: fn(&mut T, RecordId),
        /// Takes out a linked record that was attached but never persisted
        /// (identifier still 0), boxed for the owning table to store.
        /// Returns `None` when the link is unset or already persisted.
        take_unsaved: fn(&mut T) -> Option<Box<dyn Any>>,
        /// Attaches a resolved linked record. The implementation downcasts
        /// to the concrete linked type and ignores mismatches.
        set_loaded: fn(&mut T, Box<dyn Any>),
    },
}

/// One entry of a record type's field-descriptor table.
#[derive(Debug)]
pub struct FieldDescriptor<T> {
    /// Persisted field name.
    pub name: &'static str,
    /// Declared value type.
    pub field_type: FieldType,
    /// Plain field or accessor property.
    pub kind: FieldKind,
    /// The accessors.
    pub accessor: FieldAccessor<T>,
}

impl<T> FieldDescriptor<T> {
    /// Creates a scalar field descriptor.
    #[must_use]
    pub fn scalar(
        name: &'static str,
        field_type: FieldType,
        kind: FieldKind,
        get: fn(&T) -> FieldValue,
        set: fn(&mut T, FieldValue),
    ) -> Self {
        Self {
            name,
            field_type,
            kind,
            accessor: FieldAccessor::Scalar { get, set },
        }
    }

    /// Creates a linked-reference field descriptor.
    #[must_use]
    pub fn link(
        name: &'static str,
        target: &'static str,
        kind: FieldKind,
        id: fn(&T) -> RecordId,
        set_id: fn(&mut T, RecordId),
        take_unsaved: fn(&mut T) -> Option<Box<dyn Any>>,
        set_loaded: fn(&mut T, Box<dyn Any>),
    ) -> Self {
        Self {
            name,
            field_type: FieldType::Record(target.to_string()),
            kind,
            accessor: FieldAccessor::Link {
                target,
                id,
                set_id,
                take_unsaved,
                set_loaded,
            },
        }
    }
}

/// A reference to another storable record, persisted by identifier.
///
/// On disk a link is only ever the linked record's identifier; the record
/// itself lives in its own table. A freshly attached record
/// ([`Link::Loaded`] with identifier 0) is persisted into its table the
/// first time its owner is saved through the database facade.
#[derive(Debug, Clone, PartialEq)]
pub enum Link<T> {
    /// No linked record.
    Unset,
    /// Foreign-key identifier of a record in the target table.
    Id(RecordId),
    /// A resolved (or newly attached) record.
    Loaded(T),
}

impl<T: Record> Link<T> {
    /// Returns the linked identifier (0 when unset or never persisted).
    #[must_use]
    pub fn id(&self) -> RecordId {
        match self {
            Self::Unset => 0,
            Self::Id(id) => *id,
            Self::Loaded(record) => record.id(),
        }
    }

    /// Returns the resolved record, if loaded.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Loaded(record) => Some(record),
            _ => None,
        }
    }

    /// Attaches a record to this link.
    pub fn set(&mut self, record: T) {
        *self = Self::Loaded(record);
    }

    /// Takes out an attached-but-unsaved record, leaving [`Link::Unset`].
    ///
    /// Returns `None` when there is nothing unsaved to take; the facade
    /// re-points the link at the assigned identifier after persisting.
    pub fn take_unsaved(&mut self) -> Option<T> {
        match self {
            Self::Loaded(record) if record.id() == 0 => {
                let taken = std::mem::replace(self, Self::Unset);
                match taken {
                    Self::Loaded(record) => Some(record),
                    _ => unreachable!("matched Loaded above"),
                }
            }
            _ => None,
        }
    }
}

impl<T> Default for Link<T> {
    fn default() -> Self {
        Self::Unset
    }
}

/// Resolves a linked record by type tag and identifier.
///
/// The database facade implements this across its tables; the core only
/// defines the callback shape.
pub trait LinkResolver {
    /// Loads the record with the given tag and identifier, boxed as `Any`.
    ///
    /// Returns `Ok(None)` when no such record exists — absence is a normal
    /// outcome, not an error.
    fn resolve(&self, target: &str, id: RecordId) -> DbResult<Option<Box<dyn Any>>>;
}

/// Populates a record's linked fields from their foreign-key identifiers.
///
/// Resolution is one level deep: linked records come back with their own
/// links unresolved, which keeps mutually-linked tables from recursing.
///
/// # Errors
///
/// Propagates resolver failures. A dangling identifier (no record with that
/// id) leaves the link as [`Link::Id`] and is not an error.
pub fn resolve_links<T: Record>(record: &mut T, resolver: &dyn LinkResolver) -> DbResult<()> {
    for descriptor in T::descriptors() {
        if let FieldAccessor::Link {
            target,
            id,
            set_loaded,
            ..
        } = descriptor.accessor
        {
            let fk = id(record);
            if fk == 0 {
                continue;
            }
            if let Some(boxed) = resolver.resolve(target, fk)? {
                set_loaded(record, boxed);
            } else {
                tracing::warn!(
                    target_tag = target,
                    id = fk,
                    field = descriptor.name,
                    "dangling link: no record with this identifier"
                );
            }
        }
    }
    Ok(())
}
