pub mod application;
pub mod audit_log;
pub mod capability;
pub mod client;
pub mod content;
pub mod product;
pub mod refresh_token;
pub mod role;
pub mod user;

pub use application::{
    Application, ApplicationResponse, ApplicationStatus, ApplicationStatusHistory, ApplicationType,
    CreateApplicationRequest, Priority, PublicApplicationView, PublicStatusChange,
    StatusHistoryResponse, TransitionRequest, UpdateApplicationRequest,
};
pub use audit_log::{AuditLog, AuditLogResponse};
pub use capability::{Action, Capability, Module};
pub use client::{Client, ClientResponse, CreateClientRequest, UpdateClientRequest};
pub use content::{
    CreatePackageRequest, CreatePostRequest, PackageResponse, Post, PostResponse, PostStatus,
    TravelPackage, UpdatePackageRequest, UpdatePostRequest,
};
pub use product::{
    CreateOrderRequest, CreateProductRequest, Order, OrderItem, OrderItemRequest,
    OrderItemResponse, OrderResponse, OrderStatus, PaymentStatus, Product, ProductResponse,
    ProductStatus, ProductType, UpdateOrderStatusRequest, UpdateProductRequest,
};
pub use refresh_token::RefreshSession;
pub use role::{Role, RoleResponse};
pub use user::{
    AdminUser, AuthResponse, CreateUserRequest, IntrospectRequest, IntrospectResponse,
    LoginRequest, LogoutRequest, RefreshRequest, UpdateUserRequest, UserResponse,
};
