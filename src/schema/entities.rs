//! Per-entity configuration table. Each entry declares everything the
//! generic handler stack needs for one resource: URL segment,
//! collection name, validation schema, foreign keys, delete-guards and
//! uniqueness rules. Adding an entity means adding a row here, not a
//! handler module.

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;

use super::{FieldKind, FieldSpec, Schema};

pub struct EntityConfig {
    /// URL path segment, e.g. "meal-plans".
    pub path: &'static str,
    pub collection: &'static str,
    /// Lowercase label used in client-facing messages.
    pub label: &'static str,
    pub schema: Schema,
    pub foreign_keys: Vec<ForeignKey>,
    pub delete_guards: Vec<DeleteGuard>,
    /// Fields whose value must be unique within the collection,
    /// enforced by a pre-write lookup.
    pub unique_fields: &'static [&'static str],
}

/// Declares that a validated field must resolve to an existing document
/// in the target collection at write time.
pub struct ForeignKey {
    pub path: FkPath,
    pub target: &'static str,
}

pub enum FkPath {
    /// Top-level field holding one identifier.
    Scalar(&'static str),
    /// Identifier field inside each element of an array field.
    ArrayElement {
        array: &'static str,
        field: &'static str,
    },
}

/// Blocks deletion while documents in `collection` still reference the
/// entity through `field`.
pub struct DeleteGuard {
    pub collection: &'static str,
    pub field: &'static str,
    /// Lowercase dependent label for the conflict message.
    pub label: &'static str,
}

pub static ENTITIES: Lazy<Vec<EntityConfig>> = Lazy::new(|| {
    vec![
        users(),
        recipes(),
        meal_plans(),
        grocery_lists(),
        authors(),
        books(),
        contacts(),
    ]
});

pub fn lookup(path: &str) -> Option<&'static EntityConfig> {
    ENTITIES.iter().find(|e| e.path == path)
}

fn req(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, required: true, kind }
}

fn opt(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, required: false, kind }
}

fn text(min: usize, max: usize) -> FieldKind {
    FieldKind::Text { min, max }
}

fn int(min: i64, max: i64) -> FieldKind {
    FieldKind::Int { min, max }
}

fn list(min: usize, max: usize, item: FieldKind) -> FieldKind {
    FieldKind::List { min, max, item: Box::new(item) }
}

fn users() -> EntityConfig {
    EntityConfig {
        path: "users",
        collection: "users",
        label: "user",
        schema: Schema::new(vec![
            req("email", FieldKind::Email),
            req("displayName", text(2, 60)),
            opt("googleId", text(1, 100)),
            opt("dietaryPreferences", list(0, 50, text(2, 30))),
        ]),
        foreign_keys: vec![],
        delete_guards: vec![DeleteGuard {
            collection: "recipes",
            field: "authorId",
            label: "recipe",
        }],
        unique_fields: &["email"],
    }
}

fn recipes() -> EntityConfig {
    EntityConfig {
        path: "recipes",
        collection: "recipes",
        label: "recipe",
        schema: Schema::new(vec![
            req("title", text(3, 100)),
            req("description", text(10, 500)),
            req("ingredients", list(1, 30, text(1, 200))),
            req("instructions", list(1, 20, text(5, 500))),
            req("prepTime", int(1, 300)),
            req("cookTime", int(1, 600)),
            req("servingSize", int(1, 20)),
            req("difficulty", FieldKind::OneOf(&["Easy", "Medium", "Hard"])),
            req("cuisine", text(2, 30)),
            opt("tags", list(0, 30, text(2, 30))),
            req("authorId", FieldKind::Reference),
        ]),
        foreign_keys: vec![ForeignKey {
            path: FkPath::Scalar("authorId"),
            target: "users",
        }],
        delete_guards: vec![],
        unique_fields: &[],
    }
}

fn meal_plans() -> EntityConfig {
    EntityConfig {
        path: "meal-plans",
        collection: "mealPlans",
        label: "meal plan",
        schema: Schema::new(vec![
            req("userId", FieldKind::Reference),
            req("name", text(3, 100)),
            req("startDate", FieldKind::Date),
            req("endDate", FieldKind::Date),
            req(
                "meals",
                FieldKind::ObjectList {
                    min: 1,
                    max: 50,
                    shape: vec![
                        req(
                            "day",
                            FieldKind::OneOf(&[
                                "Monday", "Tuesday", "Wednesday", "Thursday", "Friday",
                                "Saturday", "Sunday",
                            ]),
                        ),
                        req(
                            "mealType",
                            FieldKind::OneOf(&["Breakfast", "Lunch", "Dinner", "Snack"]),
                        ),
                        req("recipeId", FieldKind::Reference),
                    ],
                },
            ),
            opt("notes", text(1, 500)),
        ])
        .with_ordered_dates("startDate", "endDate"),
        foreign_keys: vec![
            ForeignKey {
                path: FkPath::Scalar("userId"),
                target: "users",
            },
            ForeignKey {
                path: FkPath::ArrayElement {
                    array: "meals",
                    field: "recipeId",
                },
                target: "recipes",
            },
        ],
        delete_guards: vec![],
        unique_fields: &[],
    }
}

fn grocery_lists() -> EntityConfig {
    EntityConfig {
        path: "grocery-lists",
        collection: "groceryLists",
        label: "grocery list",
        schema: Schema::new(vec![
            req("userId", FieldKind::Reference),
            opt("mealPlanId", FieldKind::Reference),
            req("name", text(3, 100)),
            req(
                "items",
                FieldKind::ObjectList {
                    min: 1,
                    max: 100,
                    shape: vec![
                        req("name", text(1, 100)),
                        req("quantity", text(1, 50)),
                        opt(
                            "category",
                            FieldKind::OneOf(&[
                                "Produce", "Dairy", "Meat", "Bakery", "Pantry", "Frozen", "Other",
                            ]),
                        ),
                        opt("checked", FieldKind::Bool),
                    ],
                },
            ),
            opt("createdDate", FieldKind::Date),
        ]),
        foreign_keys: vec![
            ForeignKey {
                path: FkPath::Scalar("userId"),
                target: "users",
            },
            ForeignKey {
                path: FkPath::Scalar("mealPlanId"),
                target: "mealPlans",
            },
        ],
        delete_guards: vec![],
        unique_fields: &[],
    }
}

fn authors() -> EntityConfig {
    EntityConfig {
        path: "authors",
        collection: "authors",
        label: "author",
        schema: Schema::new(vec![
            req("firstName", text(2, 60)),
            req("lastName", text(2, 60)),
            req("email", FieldKind::Email),
            req("country", text(2, 60)),
            req("birthDate", FieldKind::DayStamp),
        ]),
        foreign_keys: vec![],
        delete_guards: vec![],
        unique_fields: &[],
    }
}

fn books() -> EntityConfig {
    let current_year = Utc::now().year() as i64;
    EntityConfig {
        path: "books",
        collection: "books",
        label: "book",
        schema: Schema::new(vec![
            req("title", text(3, 200)),
            req("isbn", text(10, 17)),
            req("authorId", FieldKind::Reference),
            req("publishedYear", int(1450, current_year)),
            req("genres", list(1, 5, text(2, 30))),
            req("pages", int(1, 10_000)),
            req("language", text(2, 30)),
            req("inPrint", FieldKind::Bool),
        ]),
        foreign_keys: vec![ForeignKey {
            path: FkPath::Scalar("authorId"),
            target: "authors",
        }],
        delete_guards: vec![],
        unique_fields: &[],
    }
}

fn contacts() -> EntityConfig {
    EntityConfig {
        path: "contacts",
        collection: "contacts",
        label: "contact",
        schema: Schema::new(vec![
            req("firstName", text(1, 100)),
            req("lastName", text(1, 100)),
            req("email", FieldKind::Email),
            req("favoriteColor", text(1, 100)),
            req("birthday", text(1, 100)),
        ]),
        foreign_keys: vec![],
        delete_guards: vec![],
        unique_fields: &[],
    }
}
