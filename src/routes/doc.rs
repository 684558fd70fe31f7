use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{OrderList, OrderWithItems},
        products,
        students::{GradeMoveResult, StudentList},
    },
    models::{Order, OrderItem, Product, Student, User},
    response::{ApiResponse, Meta},
    roster::{RosterClass, RosterReport, RosterRow, RosterSection},
    routes::{auth, health, orders, params, products as product_routes, students},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
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

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        students::create_student,
        students::list_students,
        students::get_student,
        students::update_student,
        students::delete_student,
        students::promote_class,
        students::move_class,
        students::roster_report
    ),
    components(
        schemas(
            User,
            Product,
            Order,
            OrderItem,
            Student,
            products::ProductList,
            OrderList,
            OrderWithItems,
            StudentList,
            GradeMoveResult,
            RosterReport,
            RosterClass,
            RosterSection,
            RosterRow,
            params::Pagination,
            params::ProductQuery,
            params::StudentQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Student>,
            ApiResponse<StudentList>,
            ApiResponse<GradeMoveResult>,
            ApiResponse<RosterReport>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Students", description = "Student record endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
