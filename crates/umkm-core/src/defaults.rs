//! Seed data written when a database is initialised.
//!
//! Seeding is insert-or-ignore, so a value the owner has changed is never
//! overwritten by a later init.

/// A setting seeded on init: `(key, value, category)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultSetting {
    pub key: &'static str,
    pub value: &'static str,
    pub category: &'static str,
}

/// A dashboard module seeded on init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultModule {
    pub slug: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub sort_order: i64,
}

const fn setting(key: &'static str, value: &'static str, category: &'static str) -> DefaultSetting {
    DefaultSetting {
        key,
        value,
        category,
    }
}

pub const DEFAULT_SETTINGS: &[DefaultSetting] = &[
    setting("business_name", "Toko UMKM", "business"),
    setting("business_logo", "", "business"),
    setting("business_address", "", "business"),
    setting("business_phone", "", "business"),
    setting("business_email", "", "business"),
    setting("primary_color", "#3b82f6", "theme"),
    setting("secondary_color", "#10b981", "theme"),
    setting("accent_color", "#f59e0b", "theme"),
    setting("dark_mode", "false", "theme"),
    setting("database_mode", "local", "database"),
    setting("ai_provider", "groq", "ai"),
    setting("ai_enabled", "true", "ai"),
    setting("language", "id", "general"),
    setting("currency", "IDR", "general"),
    setting("timezone", "Asia/Jakarta", "general"),
];

/// Category applied to settings written without one.
pub const DEFAULT_SETTING_CATEGORY: &str = "general";

pub const DEFAULT_MODULES: &[DefaultModule] = &[
    DefaultModule {
        slug: "products",
        name: "Products",
        icon: "package",
        description: "Manage products and inventory",
        sort_order: 1,
    },
    DefaultModule {
        slug: "pos",
        name: "Point of Sale",
        icon: "shopping-cart",
        description: "Record sales at the counter",
        sort_order: 2,
    },
    DefaultModule {
        slug: "customers",
        name: "Customers",
        icon: "users",
        description: "Manage customer records",
        sort_order: 3,
    },
    DefaultModule {
        slug: "suppliers",
        name: "Suppliers",
        icon: "truck",
        description: "Manage supplier records",
        sort_order: 4,
    },
    DefaultModule {
        slug: "transactions",
        name: "Transactions",
        icon: "receipt",
        description: "Transaction history",
        sort_order: 5,
    },
    DefaultModule {
        slug: "expenses",
        name: "Expenses",
        icon: "credit-card",
        description: "Log operating expenses",
        sort_order: 6,
    },
    DefaultModule {
        slug: "reports",
        name: "Reports",
        icon: "bar-chart-3",
        description: "Reports and analytics",
        sort_order: 7,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_and_slugs_are_unique() {
        let keys: HashSet<_> = DEFAULT_SETTINGS.iter().map(|s| s.key).collect();
        assert_eq!(keys.len(), DEFAULT_SETTINGS.len());

        let slugs: HashSet<_> = DEFAULT_MODULES.iter().map(|m| m.slug).collect();
        assert_eq!(slugs.len(), DEFAULT_MODULES.len());
    }

    #[test]
    fn test_known_defaults() {
        let currency = DEFAULT_SETTINGS.iter().find(|s| s.key == "currency").unwrap();
        assert_eq!(currency.value, "IDR");
        assert_eq!(DEFAULT_MODULES[0].slug, "products");
    }
}
