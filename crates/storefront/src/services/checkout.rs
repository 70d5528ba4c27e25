//! Checkout and order placement.

use ecomweb_core::{CreateOrderRequest, OrderCreated};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, CartApi, RestClient};
use crate::cart::CartSync;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No user is signed in; nothing was sent.
    #[error("not signed in")]
    NotSignedIn,

    /// The cart mirror holds no lines; nothing was sent.
    #[error("cart is empty")]
    EmptyCart,

    /// The shipping address was left blank; nothing was sent.
    #[error("shipping address is required")]
    MissingAddress,

    /// The backend call failed or was rejected.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Shipping and payment details entered at checkout.
#[derive(Debug, Clone)]
pub struct OrderForm {
    pub shipping_address: String,
    pub payment_method: String,
}

/// Payment method used when none was chosen.
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash on Delivery";

/// Checkout service.
pub struct CheckoutService<'a, A> {
    client: &'a RestClient,
    cart: &'a CartSync<A>,
}

impl<'a, A: CartApi> CheckoutService<'a, A> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(client: &'a RestClient, cart: &'a CartSync<A>) -> Self {
        Self { client, cart }
    }

    /// Check that checkout may start: someone is signed in and the mirror
    /// has at least one line.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` or `EmptyCart`.
    pub async fn begin(&self) -> Result<(), CheckoutError> {
        if self.cart.state().current_user().await.is_none() {
            return Err(CheckoutError::NotSignedIn);
        }
        if self.cart.state().cart_items().await.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(())
    }

    /// Place an order for the server cart.
    ///
    /// The server empties the cart when the order is created, so the mirror
    /// is refreshed afterwards. A failed refresh is logged; the order stands.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` or `MissingAddress` without a network call,
    /// otherwise the error of the create request.
    #[instrument(skip(self, form))]
    pub async fn place_order(&self, form: &OrderForm) -> Result<OrderCreated, CheckoutError> {
        let user = self
            .cart
            .state()
            .current_user()
            .await
            .ok_or(CheckoutError::NotSignedIn)?;

        let shipping_address = form.shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(CheckoutError::MissingAddress);
        }
        let payment_method = match form.payment_method.trim() {
            "" => DEFAULT_PAYMENT_METHOD,
            method => method,
        };

        let request = CreateOrderRequest {
            user_id: user.id,
            shipping_address: shipping_address.to_string(),
            payment_method: payment_method.to_string(),
        };
        let created = self.client.create_order(&request).await?;
        info!(order_id = %created.order_id, user_id = %user.id, "order placed");

        if let Err(e) = self.cart.refresh().await {
            warn!(error = %e, "cart refresh after order failed");
        }

        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecomweb_core::{Role, User, UserId};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::state::AppState;

    fn client() -> RestClient {
        // Nothing listens here; tests below must not reach the network
        let config = StorefrontConfig::for_api_base("http://127.0.0.1:9/api").unwrap();
        RestClient::new(&config).unwrap()
    }

    fn form(address: &str) -> OrderForm {
        OrderForm {
            shipping_address: address.to_string(),
            payment_method: String::new(),
        }
    }

    async fn signed_in_state() -> AppState {
        let state = AppState::new();
        state
            .set_user(Some(User {
                id: UserId::new(1),
                username: "asha".to_string(),
                email: String::new(),
                full_name: String::new(),
                address: String::new(),
                phone_number: String::new(),
                role: Role::User,
            }))
            .await;
        state
    }

    #[tokio::test]
    async fn test_begin_requires_user() {
        let client = client();
        let cart = CartSync::new(client.clone(), AppState::new());
        let checkout = CheckoutService::new(&client, &cart);

        assert!(matches!(
            checkout.begin().await,
            Err(CheckoutError::NotSignedIn)
        ));
        assert!(matches!(
            checkout.place_order(&form("12 MG Road")).await,
            Err(CheckoutError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_begin_requires_items() {
        let client = client();
        let cart = CartSync::new(client.clone(), signed_in_state().await);
        let checkout = CheckoutService::new(&client, &cart);

        assert!(matches!(checkout.begin().await, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_blank_address_rejected_locally() {
        let client = client();
        let cart = CartSync::new(client.clone(), signed_in_state().await);
        let checkout = CheckoutService::new(&client, &cart);

        assert!(matches!(
            checkout.place_order(&form("   ")).await,
            Err(CheckoutError::MissingAddress)
        ));
    }
}
