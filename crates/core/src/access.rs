//! Per-role field access policy for the back office.
//!
//! The back office is a single set of screens and endpoints shared by all
//! staff. What each role may see or change is decided here:
//!
//! | role             | catalog                        | users  | baskets | orders                              | reports |
//! |------------------|--------------------------------|--------|---------|-------------------------------------|---------|
//! | `Owner`          | editable                       | edit   | view    | editable                            | yes     |
//! | `CentralOffice`  | editable, name/slug read-only  | view   | view    | editable                            | yes     |
//! | `Dispatcher`     | read-only                      | hidden | hidden  | paid only, billing hidden, lines editable | no |
//!
//! Timestamps, ids and generated fields are read-only for everyone. Which
//! orders a dispatcher may list is a query concern, not a field concern.

use serde::Serialize;

use crate::types::StaffRole;

/// A back-office resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Product,
    Tag,
    ProductImage,
    User,
    Address,
    Basket,
    Order,
    OrderLine,
    Reports,
}

/// Postal sub-field of an address, billing snapshot or shipping snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressPart {
    Name,
    Address1,
    Address2,
    ZipCode,
    City,
    Country,
}

impl AddressPart {
    const ALL: [Self; 6] = [
        Self::Name,
        Self::Address1,
        Self::Address2,
        Self::ZipCode,
        Self::City,
        Self::Country,
    ];
}

/// A field of a back-office resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Slug,
    Description,
    Price,
    Active,
    InStock,
    Tags,
    Product,
    Image,
    Thumbnail,
    Email,
    FirstName,
    LastName,
    IsActive,
    Role,
    DateJoined,
    User,
    Status,
    Lines,
    Order,
    Address(AddressPart),
    Billing(AddressPart),
    Shipping(AddressPart),
    DateAdded,
    DateUpdated,
}

/// How a role may interact with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccess {
    Editable,
    ReadOnly,
    Hidden,
}

impl FieldAccess {
    /// Whether the field is shown at all.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }

    /// Whether the field may be changed.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Editable)
    }
}

impl Field {
    /// The JSON key this field is exposed under.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name | Self::Address(AddressPart::Name) => "name",
            Self::Slug => "slug",
            Self::Description => "description",
            Self::Price => "price",
            Self::Active => "active",
            Self::InStock => "in_stock",
            Self::Tags => "tags",
            Self::Product => "product",
            Self::Image => "image",
            Self::Thumbnail => "thumbnail",
            Self::Email => "email",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::IsActive => "is_active",
            Self::Role => "role",
            Self::DateJoined => "date_joined",
            Self::User => "user",
            Self::Status => "status",
            Self::Lines => "lines",
            Self::Order => "order",
            Self::Address(AddressPart::Address1) => "address1",
            Self::Address(AddressPart::Address2) => "address2",
            Self::Address(AddressPart::ZipCode) => "zip_code",
            Self::Address(AddressPart::City) => "city",
            Self::Address(AddressPart::Country) => "country",
            Self::Billing(AddressPart::Name) => "billing_name",
            Self::Billing(AddressPart::Address1) => "billing_address1",
            Self::Billing(AddressPart::Address2) => "billing_address2",
            Self::Billing(AddressPart::ZipCode) => "billing_zip_code",
            Self::Billing(AddressPart::City) => "billing_city",
            Self::Billing(AddressPart::Country) => "billing_country",
            Self::Shipping(AddressPart::Name) => "shipping_name",
            Self::Shipping(AddressPart::Address1) => "shipping_address1",
            Self::Shipping(AddressPart::Address2) => "shipping_address2",
            Self::Shipping(AddressPart::ZipCode) => "shipping_zip_code",
            Self::Shipping(AddressPart::City) => "shipping_city",
            Self::Shipping(AddressPart::Country) => "shipping_country",
            Self::DateAdded => "date_added",
            Self::DateUpdated => "date_updated",
        }
    }

    /// Fields no role may write: identifiers, timestamps, generated values.
    const fn is_system(self) -> bool {
        matches!(
            self,
            Self::Id | Self::Thumbnail | Self::DateJoined | Self::DateAdded | Self::DateUpdated
        )
    }
}

impl Resource {
    /// The fields exposed for this resource, in display order.
    #[must_use]
    pub fn fields(self) -> Vec<Field> {
        use Field::{
            Active, DateAdded, DateJoined, DateUpdated, Description, Email, FirstName, Id, Image,
            InStock, IsActive, LastName, Lines, Name, Order, Price, Product, Role,
            Slug, Status, Tags, Thumbnail, User,
        };

        match self {
            Self::Product => vec![
                Id, Name, Slug, Description, Price, Active, InStock, Tags, DateUpdated,
            ],
            Self::Tag => vec![Id, Name, Slug, Description, Active],
            Self::ProductImage => vec![Id, Product, Image, Thumbnail],
            Self::User => vec![
                Id, Email, FirstName, LastName, IsActive, Role, DateJoined,
            ],
            Self::Address => {
                let mut fields = vec![Id, User];
                fields.extend(AddressPart::ALL.map(Field::Address));
                fields
            }
            Self::Basket => vec![Id, User, Status, Lines],
            Self::Order => {
                let mut fields = vec![Id, User, Status];
                fields.extend(AddressPart::ALL.map(Field::Billing));
                fields.extend(AddressPart::ALL.map(Field::Shipping));
                fields.extend([Lines, DateAdded, DateUpdated]);
                fields
            }
            Self::OrderLine => vec![Id, Order, Product, Status],
            Self::Reports => Vec::new(),
        }
    }
}

/// Whether a role may see a resource at all.
#[must_use]
pub const fn can_view(role: StaffRole, resource: Resource) -> bool {
    match role {
        StaffRole::Owner | StaffRole::CentralOffice => true,
        StaffRole::Dispatcher => !matches!(
            resource,
            Resource::User | Resource::Address | Resource::Basket | Resource::Reports
        ),
    }
}

/// The access a role has to one field of a resource.
#[must_use]
pub const fn field_access(role: StaffRole, resource: Resource, field: Field) -> FieldAccess {
    if !can_view(role, resource) {
        return FieldAccess::Hidden;
    }
    if field.is_system() {
        return FieldAccess::ReadOnly;
    }

    match role {
        StaffRole::Owner => FieldAccess::Editable,
        StaffRole::CentralOffice => central_office_access(resource, field),
        StaffRole::Dispatcher => dispatcher_access(resource, field),
    }
}

const fn central_office_access(resource: Resource, field: Field) -> FieldAccess {
    match (resource, field) {
        (Resource::Product | Resource::Tag, Field::Name | Field::Slug)
        | (Resource::User | Resource::Address, _) => FieldAccess::ReadOnly,
        _ => FieldAccess::Editable,
    }
}

const fn dispatcher_access(resource: Resource, field: Field) -> FieldAccess {
    match (resource, field) {
        (Resource::Order, Field::Billing(_)) => FieldAccess::Hidden,
        (Resource::OrderLine, Field::Status) => FieldAccess::Editable,
        _ => FieldAccess::ReadOnly,
    }
}
