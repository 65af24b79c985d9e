//! Ingestion step: fold every free-text field once and attach the derived
//! keys the engines compare on.

use crate::config::{KpiConfig, LinkageStrategy};
use crate::normalize;
use crate::types::{ServiceCategory, ServiceOrder};

/// "Same installation point" identity used to partition orders for pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkageKey {
    pub client: String,
    pub location: String,
}

impl LinkageKey {
    pub fn for_order(order: &ServiceOrder, strategy: LinkageStrategy) -> Self {
        let location = match strategy {
            LinkageStrategy::Address if order.has_street_address() => {
                let street = normalize::fold_joined([
                    order.street.as_deref().unwrap_or_default(),
                    order.street_number.as_deref().unwrap_or_default(),
                    order.complement.as_deref().unwrap_or_default(),
                    order.postal_code.as_deref().unwrap_or_default(),
                ]);
                format!("addr:{street}")
            }
            LinkageStrategy::Address | LinkageStrategy::Neighborhood => {
                let area = normalize::fold_joined([order.city.as_str(), order.neighborhood.as_str()]);
                format!("area:{area}")
            }
        };
        Self {
            client: order.client_code.trim().to_string(),
            location,
        }
    }
}

/// Matcher for the configured "original" service types.
#[derive(Debug, Clone)]
pub struct OriginalTypes {
    /// (folded key, display label) in configuration order
    entries: Vec<(String, String)>,
}

impl OriginalTypes {
    pub fn new(types: &[String]) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for label in types {
            let key = normalize::fold(label);
            if key.is_empty() || entries.iter().any(|(k, _)| *k == key) {
                continue;
            }
            entries.push((key, label.trim().to_string()));
        }
        Self { entries }
    }

    /// Label of the first original type matching the folded type/subtype.
    ///
    /// A type matches when it equals the service type, or appears inside the
    /// subtype (`"Instalação Ponto Principal TV"` is a "Ponto Principal").
    /// Short types must match a whole word of the subtype.
    pub fn classify(&self, type_key: &str, subtype_key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| type_key == key || normalize::contains_keyword(subtype_key, key))
            .map(|(_, label)| label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, label)| label.as_str())
    }

    /// Display label for a folded filter value, if it names a configured type.
    pub fn label_for_key(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, label)| label.as_str())
    }
}

/// Folded keys of the free-text columns reopenings are broken down by.
///
/// Blank columns fold to an empty key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionKeys {
    pub technician: String,
    pub city: String,
    pub neighborhood: String,
}

impl DimensionKeys {
    pub fn for_order(order: &ServiceOrder) -> Self {
        Self {
            technician: normalize::fold(order.technician_label()),
            city: normalize::fold(&order.city),
            neighborhood: normalize::fold(&order.neighborhood),
        }
    }
}

/// Borrowed view of a `ServiceOrder` with its comparison keys precomputed.
#[derive(Debug, Clone)]
pub struct PreparedOrder<'a> {
    pub order: &'a ServiceOrder,
    pub status_key: String,
    pub type_key: String,
    pub subtype_key: String,
    pub reason_key: String,
    pub dimensions: DimensionKeys,
    pub category: ServiceCategory,
    pub linkage: LinkageKey,
    /// Configured original-type label, when the order can open a pair
    pub original_type: Option<String>,
}

impl PreparedOrder<'_> {
    pub fn code(&self) -> &str {
        &self.order.code
    }

    pub fn is_original(&self) -> bool {
        self.original_type.is_some()
    }
}

/// Builds `PreparedOrder`s for one configuration.
#[derive(Debug, Clone)]
pub struct OrderPreparer {
    tv_keywords: Vec<String>,
    fibra_keywords: Vec<String>,
    original_types: OriginalTypes,
    linkage: LinkageStrategy,
}

impl OrderPreparer {
    pub fn new(config: &KpiConfig) -> Self {
        Self {
            tv_keywords: normalize::fold_all(&config.categories.tv_keywords),
            fibra_keywords: normalize::fold_all(&config.categories.fibra_keywords),
            original_types: OriginalTypes::new(&config.reopening.original_types),
            linkage: config.reopening.linkage,
        }
    }

    pub fn original_types(&self) -> &OriginalTypes {
        &self.original_types
    }

    pub fn prepare<'a>(&self, order: &'a ServiceOrder) -> PreparedOrder<'a> {
        let type_key = normalize::fold(&order.service_type);
        let subtype_key = normalize::fold(&order.service_subtype);
        let category = ServiceCategory::classify(&subtype_key, &self.tv_keywords, &self.fibra_keywords);
        let original_type = self
            .original_types
            .classify(&type_key, &subtype_key)
            .map(str::to_string);

        PreparedOrder {
            order,
            status_key: normalize::fold(&order.status),
            reason_key: normalize::fold(&order.reason),
            dimensions: DimensionKeys::for_order(order),
            linkage: LinkageKey::for_order(order, self.linkage),
            type_key,
            subtype_key,
            category,
            original_type,
        }
    }

    pub fn prepare_all<'a, I>(&self, orders: I) -> Vec<PreparedOrder<'a>>
    where
        I: IntoIterator<Item = &'a ServiceOrder>,
    {
        orders.into_iter().map(|o| self.prepare(o)).collect()
    }
}
