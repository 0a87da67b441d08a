use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{
    admin_users, books, categories, contacts, dashboard, orders, reviews, users,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Bookstore API", description = "Catalog, ordering, reviews and support for an online bookstore"),
    paths(
        crate::handlers::health,
        users::register,
        users::login,
        users::me,
        users::update_me,
        admin_users::list_users,
        admin_users::create_user,
        admin_users::get_user,
        admin_users::update_user,
        admin_users::delete_user,
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::rename_category,
        categories::delete_category,
        categories::list_payment_methods,
        categories::list_discounts,
        categories::create_discount,
        orders::create_order,
        orders::my_orders,
        orders::all_orders,
        orders::get_order,
        orders::cancel_order,
        orders::confirm_delivery,
        orders::update_status,
        reviews::create_review,
        reviews::list_reviews,
        reviews::review_summary,
        reviews::update_review,
        reviews::delete_review,
        contacts::create_contact,
        contacts::list_contacts,
        contacts::get_contact,
        contacts::reply_contact,
        contacts::delete_contact,
        dashboard::stats,
        dashboard::order_status,
        dashboard::monthly_trends,
    ),
    components(schemas(crate::handlers::MessageResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Registration, login and own profile"),
        (name = "admin", description = "Account management"),
        (name = "books", description = "Book catalog"),
        (name = "categories", description = "Book categories"),
        (name = "catalog", description = "Payment methods and vouchers"),
        (name = "orders", description = "Checkout and order lifecycle"),
        (name = "reviews", description = "Book reviews"),
        (name = "contacts", description = "Support messages"),
        (name = "dashboard", description = "Admin figures"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
