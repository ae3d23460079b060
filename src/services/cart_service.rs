use log::warn;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::models::{
    cart::{AddToCartInput, Cart, CartItem, CartItemUpdate, Order, OrderInput},
    selection::SelectionState,
};

#[derive(Debug, Error)]
pub enum CartError {
    /// Cart mutations need a signed-in session; this one is user-actionable.
    #[error("sign in required before modifying the cart")]
    SignInRequired,
    /// The seat/slot was taken between selection and submission. The caller
    /// must send the user back to seat/slot selection.
    #[error("selection is no longer available")]
    NoLongerAvailable,
    #[error("cart item not found")]
    ItemNotFound,
    #[error("cart endpoint rejected the request: {0}")]
    Rejected(String),
    #[error("failed to encode booking data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to reach cart endpoint: {0}")]
    Network(#[from] reqwest::Error),
}

pub trait CartBackend {
    async fn add_item(&self, token: &str, input: &AddToCartInput) -> Result<CartItem, CartError>;
    async fn update_item(
        &self,
        token: &str,
        item_id: &str,
        update: &CartItemUpdate,
    ) -> Result<CartItem, CartError>;
    async fn remove_item(&self, token: &str, item_id: &str) -> Result<(), CartError>;
    async fn clear(&self, token: &str) -> Result<(), CartError>;
    async fn fetch_cart(&self, token: &str) -> Result<Cart, CartError>;
    async fn submit_order(&self, token: &str, input: &OrderInput) -> Result<Order, CartError>;
}

/// Cart mutations over the REST endpoints.
pub struct HttpCartBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpCartBackend {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CartError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 | 403 => CartError::SignInRequired,
            404 => CartError::ItemNotFound,
            409 => CartError::NoLongerAvailable,
            _ => CartError::Rejected(format!("status {}: {}", status.as_u16(), body)),
        })
    }
}

impl CartBackend for HttpCartBackend {
    async fn add_item(&self, token: &str, input: &AddToCartInput) -> Result<CartItem, CartError> {
        let response = self
            .http_client
            .post(self.url("/cart/add"))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_item(
        &self,
        token: &str,
        item_id: &str,
        update: &CartItemUpdate,
    ) -> Result<CartItem, CartError> {
        let response = self
            .http_client
            .put(self.url(&format!("/cart/{}", item_id)))
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn remove_item(&self, token: &str, item_id: &str) -> Result<(), CartError> {
        let response = self
            .http_client
            .delete(self.url(&format!("/cart/{}", item_id)))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn clear(&self, token: &str) -> Result<(), CartError> {
        let response = self
            .http_client
            .delete(self.url("/cart"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_cart(&self, token: &str) -> Result<Cart, CartError> {
        let response = self
            .http_client
            .get(self.url("/cart"))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn submit_order(&self, token: &str, input: &OrderInput) -> Result<Order, CartError> {
        let response = self
            .http_client
            .post(self.url("/orders"))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

/// Applies cart mutations and keeps a local read model of the server's
/// cart. Every mutation is followed by a full refresh; displayed totals
/// are always the server's last response, never a local recomputation.
pub struct CartService<B: CartBackend> {
    backend: B,
    session_token: Option<String>,
    cart: Option<Cart>,
}

impl<B: CartBackend> CartService<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session_token: None,
            cart: None,
        }
    }

    pub fn sign_in(&mut self, token: impl Into<String>) {
        self.session_token = Some(token.into());
    }

    pub fn sign_out(&mut self) {
        self.session_token = None;
        self.cart = None;
    }

    /// Local mirror of the server-side cart, as of the last refresh.
    pub fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    fn token(&self) -> Result<String, CartError> {
        self.session_token
            .clone()
            .ok_or(CartError::SignInRequired)
    }

    pub async fn add_to_cart(
        &mut self,
        selection: &SelectionState,
    ) -> Result<CartItem, CartError> {
        let token = self.token()?;
        let input = AddToCartInput::from_selection(selection)?;
        let item = self.backend.add_item(&token, &input).await?;
        self.refresh_with(&token).await?;
        Ok(item)
    }

    pub async fn update_item(
        &mut self,
        item_id: &str,
        update: CartItemUpdate,
    ) -> Result<CartItem, CartError> {
        let token = self.token()?;
        let item = self.backend.update_item(&token, item_id, &update).await?;
        self.refresh_with(&token).await?;
        Ok(item)
    }

    pub async fn remove_item(&mut self, item_id: &str) -> Result<(), CartError> {
        let token = self.token()?;
        self.backend.remove_item(&token, item_id).await?;
        self.refresh_with(&token).await
    }

    pub async fn clear(&mut self) -> Result<(), CartError> {
        let token = self.token()?;
        self.backend.clear(&token).await?;
        self.refresh_with(&token).await
    }

    pub async fn refresh(&mut self) -> Result<&Cart, CartError> {
        let token = self.token()?;
        self.refresh_with(&token).await?;
        Ok(self.cart.as_ref().expect("cart set by refresh"))
    }

    /// Place an order for the current cart. The cart is refreshed first if
    /// it has never been fetched, and again afterwards.
    pub async fn checkout(
        &mut self,
        special_requests: Option<String>,
    ) -> Result<Order, CartError> {
        let token = self.token()?;
        if self.cart.is_none() {
            self.refresh_with(&token).await?;
        }
        let cart_id = self
            .cart
            .as_ref()
            .map(|c| c.id.clone())
            .ok_or_else(|| CartError::Rejected("no cart to order".to_string()))?;

        let order = self
            .backend
            .submit_order(
                &token,
                &OrderInput {
                    cart_id,
                    special_requests,
                },
            )
            .await?;

        if let Err(err) = self.refresh_with(&token).await {
            // The order went through; a failed refresh only staled the mirror.
            warn!("cart refresh after checkout failed: {}", err);
        }
        Ok(order)
    }

    async fn refresh_with(&mut self, token: &str) -> Result<(), CartError> {
        self.cart = Some(self.backend.fetch_cart(token).await?);
        Ok(())
    }
}
