use std::cmp::Ordering;

use tracing::debug;

use super::Convertor;
use super::EnumConvertor;
use super::GenericObjectConvertor;
use super::HostContainerConvertor;
use super::HostObjectConvertor;
use super::ObjectRefConvertor;
use super::OptionalConvertor;
use super::PrimitiveConvertor;
use super::Priority;
use super::SequenceConvertor;
use crate::reflect::TypeInfo;

/// Ordered set of convertors, immutable once the reflector is built
pub struct ConvertorRegistry {
    convertors: Vec<Box<dyn Convertor>>,
    fallback:   GenericObjectConvertor,
}

impl std::fmt::Debug for ConvertorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.convertors.iter().map(|c| c.name()))
            .finish()
    }
}

impl Default for ConvertorRegistry {
    fn default() -> Self { Self::with_builtins() }
}

impl ConvertorRegistry {
    /// Registry holding only the generic fallback
    pub fn empty() -> Self {
        Self {
            convertors: Vec::new(),
            fallback:   GenericObjectConvertor,
        }
    }

    /// Registry holding every built-in convertor
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(GenericObjectConvertor));
        registry.register(Box::new(PrimitiveConvertor));
        registry.register(Box::new(EnumConvertor));
        registry.register(Box::new(SequenceConvertor));
        registry.register(Box::new(OptionalConvertor));
        registry.register(Box::new(ObjectRefConvertor));
        registry.register(Box::new(HostObjectConvertor));
        registry.register(Box::new(HostContainerConvertor));
        registry
    }

    /// Add a convertor, replacing one registered under the same name
    pub fn register(&mut self, convertor: Box<dyn Convertor>) {
        debug!(convertor = convertor.name(), "Registering convertor");
        self.convertors.retain(|c| c.name() != convertor.name());
        self.convertors.push(convertor);
    }

    /// Convertor with the highest priority for `info`
    ///
    /// Equal priorities resolve to the lexically smallest name, so the outcome does not depend
    /// on registration order.
    pub fn resolve(&self, info: &TypeInfo) -> &dyn Convertor {
        self.convertors
            .iter()
            .filter_map(|convertor| {
                convertor
                    .priority(info)
                    .map(|priority| (convertor.as_ref(), priority))
            })
            .max_by(|(a, pa), (b, pb)| compare(*a, *pa, *b, *pb))
            .map_or(&self.fallback as &dyn Convertor, |(convertor, _)| convertor)
    }

    /// Every applicable convertor for `info`, best first
    pub fn ranked(&self, info: &TypeInfo) -> Vec<(&'static str, Priority)> {
        let mut ranked: Vec<_> = self
            .convertors
            .iter()
            .filter_map(|convertor| {
                convertor
                    .priority(info)
                    .map(|priority| (convertor.as_ref(), priority))
            })
            .collect();
        ranked.sort_by(|(a, pa), (b, pb)| compare(*b, *pb, *a, *pa));
        ranked
            .into_iter()
            .map(|(convertor, priority)| (convertor.name(), priority))
            .collect()
    }

    /// Number of registered convertors
    pub fn len(&self) -> usize { self.convertors.len() }

    /// True when only the implicit fallback is available
    pub fn is_empty(&self) -> bool { self.convertors.is_empty() }
}

/// Orders by priority, then prefers the smaller name
fn compare(a: &dyn Convertor, pa: Priority, b: &dyn Convertor, pb: Priority) -> Ordering {
    pa.cmp(&pb).then_with(|| b.name().cmp(a.name()))
}
