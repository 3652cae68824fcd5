//! Device type/function resolution with negative caching.
//!
//! The catalog answers one question: does this type or function have a
//! device-side implementation, and if so, under which descriptor. Both
//! answers are memoized, including the "no" answers, so a schema entity is
//! examined at most once between schema changes. A schema change throws
//! both caches away wholesale; descriptors already handed out stay valid
//! as snapshots of the schema they were built against.

pub mod devfuncs;
pub mod devtypes;
pub mod schema;

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;

use devfuncs::{FunctionDescriptor, OpCode, DEVFUNC_CATALOG};
use devtypes::{DeviceFlags, TypeDescriptor, TypeShape, DEVTYPE_CATALOG};
use schema::{
    ChangeNotifier, CollationId, FuncId, SchemaProvider, TypeId, TypeProperties, TypedExpression,
};

/// Function cache key: the full call signature. Two calls share a
/// descriptor only when the function and every argument type id agree,
/// so a bucket hit can never alias a different signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FuncKey {
    func_id: FuncId,
    arg_types: Vec<TypeId>,
}

#[derive(Default)]
struct Caches {
    types: HashMap<TypeId, Arc<TypeDescriptor>>,
    funcs: HashMap<FuncKey, Arc<FunctionDescriptor>>,
}

pub struct DeviceCatalog {
    schema: Arc<dyn SchemaProvider>,
    caches: RwLock<Caches>,
}

impl DeviceCatalog {
    pub fn new(schema: Arc<dyn SchemaProvider>) -> Self {
        DeviceCatalog {
            schema,
            caches: RwLock::new(Caches::default()),
        }
    }

    /// Drop every cached descriptor, positive and negative. Called on any
    /// schema-relevant change notification.
    pub fn invalidate(&self) {
        let mut caches = self.caches.write();
        let (ntypes, nfuncs) = (caches.types.len(), caches.funcs.len());
        *caches = Caches::default();
        debug!(ntypes, nfuncs, "device catalog caches reset");
    }

    /// Subscribe this catalog to a schema change bus. The callback holds a
    /// weak reference, so a dropped catalog just stops reacting.
    pub fn register_invalidation(self: &Arc<Self>, bus: &dyn ChangeNotifier) {
        let weak: Weak<DeviceCatalog> = Arc::downgrade(self);
        bus.on_schema_change(Box::new(move || {
            if let Some(catalog) = weak.upgrade() {
                catalog.invalidate();
            }
        }));
    }

    /// Resolve a type to its device descriptor. `Ok(None)` means the type
    /// exists but has no device implementation; an error means the schema
    /// has no such type at all.
    pub fn resolve_type(&self, type_id: TypeId) -> Result<Option<Arc<TypeDescriptor>>> {
        if let Some(desc) = self.caches.read().types.get(&type_id) {
            return Ok(positive_type(desc));
        }
        let mut caches = self.caches.write();
        let desc = self.resolve_type_locked(&mut caches, type_id)?;
        Ok(positive_type(&desc))
    }

    /// Build-or-fetch under an already held write lock. Container types
    /// recurse through here so the whole resolution happens under one
    /// lock acquisition.
    fn resolve_type_locked(
        &self,
        caches: &mut Caches,
        type_id: TypeId,
    ) -> Result<Arc<TypeDescriptor>> {
        if let Some(desc) = caches.types.get(&type_id) {
            return Ok(desc.clone());
        }
        let props = self.schema.type_properties(type_id)?;
        let built = if props.fields.is_some() {
            self.build_composite(caches, type_id, &props)?
        } else if props.element.is_some() && props.length.is_variable() {
            self.build_array(caches, type_id, &props)?
        } else {
            build_base(type_id, &props)
        };
        let desc = Arc::new(match built {
            Some(desc) => desc,
            None => {
                debug!(type_id = %type_id, name = %props.name, "type is not device-executable");
                TypeDescriptor::tombstone(type_id)
            }
        });
        caches.types.insert(type_id, desc.clone());
        Ok(desc)
    }

    fn build_array(
        &self,
        caches: &mut Caches,
        type_id: TypeId,
        props: &TypeProperties,
    ) -> Result<Option<TypeDescriptor>> {
        let element_id = match props.element {
            Some(id) => id,
            None => return Ok(None),
        };
        let element = self.resolve_type_locked(caches, element_id)?;
        if element.is_negative() {
            return Ok(None);
        }
        debug!(type_id = %type_id, element = %element_id, "array type resolved");
        Ok(Some(TypeDescriptor {
            type_id,
            name: format!("{}[]", element.name),
            extension: props.extension.clone(),
            flags: element.flags,
            length: props.length,
            align: props.align,
            by_val: props.by_val,
            eq_func: element.eq_func,
            cmp_func: element.cmp_func,
            extra_size: 0,
            shape: TypeShape::Array { element },
        }))
    }

    fn build_composite(
        &self,
        caches: &mut Caches,
        type_id: TypeId,
        props: &TypeProperties,
    ) -> Result<Option<TypeDescriptor>> {
        let field_ids = match &props.fields {
            Some(ids) => ids,
            None => return Ok(None),
        };
        let mut flags = DeviceFlags::ANY;
        let mut fields = Vec::with_capacity(field_ids.len());
        for field_id in field_ids {
            let field = self.resolve_type_locked(caches, *field_id)?;
            if field.is_negative() {
                return Ok(None);
            }
            flags &= field.flags;
            fields.push(field);
        }
        debug!(type_id = %type_id, nfields = fields.len(), "composite type resolved");
        Ok(Some(TypeDescriptor {
            type_id,
            name: props.name.clone(),
            extension: props.extension.clone(),
            flags,
            length: props.length,
            align: props.align,
            by_val: props.by_val,
            eq_func: None,
            cmp_func: None,
            extra_size: 0,
            shape: TypeShape::Composite { fields },
        }))
    }

    /// Resolve a function call signature. `Ok(None)` means not
    /// device-executable, either inherently or under the given collation.
    pub fn resolve_function(
        &self,
        func_id: FuncId,
        arg_types: &[TypeId],
        collation: CollationId,
    ) -> Result<Option<Arc<FunctionDescriptor>>> {
        let key = FuncKey {
            func_id,
            arg_types: arg_types.to_vec(),
        };
        if let Some(desc) = self.caches.read().funcs.get(&key) {
            return Ok(gate(desc, collation));
        }
        let mut caches = self.caches.write();
        if let Some(desc) = caches.funcs.get(&key) {
            return Ok(gate(desc, collation));
        }
        let desc = self.build_function_locked(&mut caches, func_id, arg_types)?;
        caches.funcs.insert(key, desc.clone());
        Ok(gate(&desc, collation))
    }

    /// Convenience wrapper taking expression nodes instead of bare type ids.
    pub fn resolve_function_call<E: TypedExpression>(
        &self,
        func_id: FuncId,
        args: &[E],
        collation: CollationId,
    ) -> Result<Option<Arc<FunctionDescriptor>>> {
        let arg_types: Vec<TypeId> = args.iter().map(|a| a.expr_type()).collect();
        self.resolve_function(func_id, &arg_types, collation)
    }

    fn build_function_locked(
        &self,
        caches: &mut Caches,
        func_id: FuncId,
        arg_types: &[TypeId],
    ) -> Result<Arc<FunctionDescriptor>> {
        let props = self.schema.function_properties(func_id)?;

        // Resolve every argument even when one fails: a negative
        // descriptor still records what types were involved, with
        // tombstones in the unsupported slots.
        let mut args = Vec::with_capacity(arg_types.len());
        let mut supported = true;
        let mut signature = String::new();
        for (i, type_id) in arg_types.iter().enumerate() {
            let arg = self.resolve_type_locked(caches, *type_id)?;
            if arg.is_negative() {
                supported = false;
            }
            if i > 0 {
                signature.push('/');
            }
            signature.push_str(&arg.name);
            args.push(arg);
        }

        let matched = if supported {
            DEVFUNC_CATALOG.iter().find(|entry| {
                extension_matches(&props.extension, entry.extension, props.in_system_namespace)
                    && entry.name == props.name
                    && entry.signature == signature
            })
        } else {
            None
        };

        let desc = match matched {
            Some(entry) => {
                debug!(func_id = %func_id, name = %props.name, opcode = ?entry.opcode,
                       "device function resolved");
                FunctionDescriptor {
                    func_id,
                    name: props.name,
                    extension: props.extension,
                    flags: entry.flags,
                    opcode: entry.opcode,
                    arg_types: args,
                }
            }
            None => {
                debug!(func_id = %func_id, name = %props.name, signature = %signature,
                       "function is not device-executable");
                FunctionDescriptor {
                    func_id,
                    name: props.name,
                    extension: props.extension,
                    flags: DeviceFlags::empty(),
                    opcode: OpCode::Invalid,
                    arg_types: args,
                }
            }
        };
        Ok(Arc::new(desc))
    }
}

/// Post-lookup validation, applied to cache hits and fresh builds alike.
fn gate(desc: &Arc<FunctionDescriptor>, collation: CollationId) -> Option<Arc<FunctionDescriptor>> {
    if desc.is_negative() {
        return None;
    }
    if !collation.is_none()
        && !collation.is_byte_ordering()
        && desc.flags.contains(DeviceFlags::LOCALE_AWARE)
    {
        return None;
    }
    Some(desc.clone())
}

fn positive_type(desc: &Arc<TypeDescriptor>) -> Option<Arc<TypeDescriptor>> {
    if desc.is_negative() {
        None
    } else {
        Some(desc.clone())
    }
}

/// An extension-owned schema entity only matches a table row claiming the
/// same extension; a built-in entity only matches extension-less rows, and
/// only when it really lives in the system namespace.
fn extension_matches(
    schema_ext: &Option<String>,
    entry_ext: Option<&str>,
    in_system_namespace: bool,
) -> bool {
    match (schema_ext, entry_ext) {
        (Some(schema), Some(entry)) => schema == entry,
        (None, None) => in_system_namespace,
        _ => false,
    }
}

fn build_base(type_id: TypeId, props: &TypeProperties) -> Option<TypeDescriptor> {
    for entry in DEVTYPE_CATALOG {
        if extension_matches(&props.extension, entry.extension, props.in_system_namespace)
            && entry.name == props.name
        {
            debug!(type_id = %type_id, name = %props.name, "base type resolved");
            return Some(TypeDescriptor {
                type_id,
                name: props.name.clone(),
                extension: props.extension.clone(),
                flags: entry.flags,
                length: props.length,
                align: props.align,
                by_val: props.by_val,
                eq_func: props.eq_func,
                cmp_func: props.cmp_func,
                extra_size: entry.extra_size,
                shape: TypeShape::Base { codec: entry.codec },
            });
        }
    }
    None
}
