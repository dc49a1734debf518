//! Built-in storefront policy.
//!
//! Used when no policy file supplies roles or routes.

use crate::error::AuthzError;
use crate::route::{RouteConfig, RouteTable};
use crate::types::{Action, Grant, PermissionKey, Resource, Role, RoleTable};

use Action::*;

fn key(resource: Resource, action: Action) -> PermissionKey {
    PermissionKey::new(resource, action)
}

/// The predefined role hierarchy.
pub fn storefront_role_table() -> RoleTable {
    RoleTable::new()
        .with_role(
            Role::SuperAdmin,
            Resource::ALL.iter().map(|&r| Grant::manage(r)),
        )
        .with_role(
            Role::Admin,
            [
                Grant::manage(Resource::Users),
                Grant::manage(Resource::Products),
                Grant::manage(Resource::Orders),
                Grant::manage(Resource::Categories),
                Grant::manage(Resource::Sellers),
                Grant::manage(Resource::Payments),
                Grant::manage(Resource::Reviews),
                Grant::manage(Resource::Inventory),
                Grant::manage(Resource::Banners),
                Grant::manage(Resource::Videos),
                Grant::new(Resource::Settings, [Read, Update]),
                Grant::new(Resource::AuditLogs, [Read, Export]),
                Grant::new(Resource::ScheduledJobs, [Read]),
                Grant::new(Resource::Roles, [Read]),
                Grant::new(Resource::Reports, [Read, Export]),
            ],
        )
        .with_role(
            Role::Manager,
            [
                Grant::manage(Resource::Products),
                Grant::manage(Resource::Orders),
                Grant::manage(Resource::Categories),
                Grant::manage(Resource::Inventory),
                Grant::new(Resource::Reviews, [Read, Approve, Reject]),
                Grant::new(Resource::Sellers, [Read, Approve, Reject]),
                Grant::new(Resource::Users, [Read]),
                Grant::new(Resource::Payments, [Read]),
                Grant::new(Resource::Reports, [Read, Export]),
            ],
        )
        .with_role(
            Role::Seller,
            [
                Grant::new(Resource::Products, [Create, Read, Update, Delete]).own(),
                Grant::new(Resource::Orders, [Read, Update]).own(),
                Grant::new(Resource::Inventory, [Read, Update, Import, Export]).own(),
                Grant::new(Resource::Payments, [Read]).own(),
                Grant::new(Resource::Reports, [Read]).own(),
                Grant::new(Resource::Reviews, [Read]),
                Grant::new(Resource::Categories, [Read]),
            ],
        )
        .with_role(
            Role::ContentEditor,
            [
                Grant::manage(Resource::Banners),
                Grant::manage(Resource::Videos),
                Grant::new(Resource::Categories, [Read, Update]),
                Grant::new(Resource::Products, [Read, Update]),
            ],
        )
        .with_role(
            Role::Support,
            [
                Grant::new(Resource::Users, [Read, Update]),
                Grant::new(Resource::Orders, [Read, Update]),
                Grant::new(Resource::Reviews, [Read, Approve, Reject]),
                Grant::new(Resource::Payments, [Read]),
                Grant::new(Resource::Products, [Read]),
            ],
        )
        .with_role(
            Role::User,
            [
                Grant::new(Resource::Products, [Read]),
                Grant::new(Resource::Categories, [Read]),
                Grant::new(Resource::Reviews, [Create, Read]),
                Grant::new(Resource::Reviews, [Update, Delete]).own(),
                Grant::new(Resource::Orders, [Create, Read]).own(),
                Grant::new(Resource::Users, [Read, Update]).own(),
            ],
        )
        .with_role(
            Role::Guest,
            [
                Grant::new(Resource::Products, [Read]),
                Grant::new(Resource::Categories, [Read]),
                Grant::new(Resource::Reviews, [Read]),
            ],
        )
}

/// The storefront, account, seller and admin route map.
pub fn storefront_routes() -> Result<RouteTable, AuthzError> {
    use Role::*;

    let staff = [SuperAdmin, Admin, Manager];
    let admins = [SuperAdmin, Admin];

    Ok(RouteTable::new()
        .with_route(RouteConfig::public("/")?)
        .with_route(RouteConfig::public("/login")?)
        .with_route(RouteConfig::public("/register")?)
        .with_route(RouteConfig::public("/products")?)
        .with_route(RouteConfig::public("/products/:id")?)
        .with_route(RouteConfig::public("/categories/:slug")?)
        .with_route(RouteConfig::new("/cart")?.redirect_to("/login"))
        .with_route(
            RouteConfig::new("/checkout")?
                .with_permissions([key(Resource::Orders, Create)])
                .redirect_to("/login"),
        )
        .with_route(RouteConfig::new("/account")?.redirect_to("/login"))
        .with_route(
            RouteConfig::new("/account/orders")?
                .with_permissions([key(Resource::Orders, Read)])
                .redirect_to("/login"),
        )
        .with_route(RouteConfig::new("/admin/dashboard")?.with_roles(staff))
        .with_route(
            RouteConfig::new("/admin/users")?
                .with_roles(admins)
                .with_permissions([key(Resource::Users, Read)]),
        )
        .with_route(
            RouteConfig::new("/admin/users/:id")?
                .with_roles(admins)
                .with_permissions([key(Resource::Users, Read), key(Resource::Users, Update)]),
        )
        .with_route(
            RouteConfig::new("/admin/products")?
                .with_roles(staff)
                .with_permissions([key(Resource::Products, Update)]),
        )
        .with_route(
            RouteConfig::new("/admin/orders")?
                .with_roles(staff)
                .with_permissions([key(Resource::Orders, Read)]),
        )
        .with_route(
            RouteConfig::new("/admin/orders/:id")?
                .with_roles(staff)
                .with_permissions([key(Resource::Orders, Update)]),
        )
        .with_route(
            RouteConfig::new("/admin/roles")?
                .with_roles(admins)
                .with_permissions([key(Resource::Roles, Read)]),
        )
        .with_route(
            RouteConfig::new("/admin/settings")?
                .with_roles(admins)
                .with_permissions([key(Resource::Settings, Update)]),
        )
        .with_route(
            RouteConfig::new("/admin/audit-logs")?
                .with_roles(admins)
                .with_permissions([key(Resource::AuditLogs, Read)]),
        )
        .with_route(
            RouteConfig::new("/admin/jobs")?
                .with_roles(admins)
                .with_permissions([key(Resource::ScheduledJobs, Manage)]),
        )
        .with_route(
            RouteConfig::new("/admin/reports")?
                .with_roles(staff)
                .with_permissions([key(Resource::Reports, Export)]),
        )
        .with_route(
            RouteConfig::new("/content/banners")?
                .with_roles([SuperAdmin, Admin, ContentEditor])
                .with_permissions([key(Resource::Banners, Update)]),
        )
        .with_route(
            RouteConfig::new("/content/videos")?
                .with_roles([SuperAdmin, Admin, ContentEditor])
                .with_permissions([key(Resource::Videos, Update)]),
        )
        .with_route(
            RouteConfig::new("/support/tickets")?
                .with_roles([SuperAdmin, Admin, Support])
                .with_permissions([key(Resource::Users, Read)]),
        )
        .with_route(RouteConfig::new("/seller")?.with_roles([Seller]))
        .with_route(
            RouteConfig::new("/seller/:id")?
                .with_roles([Seller, Admin, SuperAdmin])
                .with_permissions([key(Resource::Products, Read)]),
        )
        .with_route(
            RouteConfig::new("/seller/:id/orders")?
                .with_roles([Seller])
                .with_permissions([key(Resource::Orders, Read)]),
        )
        .with_route(
            RouteConfig::new("/seller/:id/inventory")?
                .with_roles([Seller])
                .with_permissions([key(Resource::Inventory, Update)]),
        ))
}
