//! Cart mirror kept in step with the server cart.
//!
//! The server owns the cart. Every mutation is sent first and, once the
//! server accepts it, followed by a full refresh that replaces the local
//! mirror wholesale. Nothing is applied optimistically, so the mirror only
//! ever holds a listing the server actually returned.
//!
//! # Mutation lifecycle
//!
//! ```text
//! Idle -> Pending (request in flight) -> Applied (refresh triggered) -> Idle
//!                                     -> Failed  (mirror unchanged)  -> Idle
//! ```
//!
//! Mutations are neither queued nor coalesced. Two overlapping mutations each
//! trigger their own refresh and whichever refresh completes last decides
//! what the mirror shows, even if it carries the older server state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use ecomweb_core::{AddToCartRequest, CartItem, CartItemId, Price, ProductId, User};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, CartApi};
use crate::state::{AppState, CartSnapshot};

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No user is signed in; nothing was sent.
    #[error("not signed in")]
    NotSignedIn,

    /// The backend call failed or was rejected.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server accepted the change but the follow-up refresh failed.
    /// The mirror still holds the listing from before the change.
    #[error("cart changed but reload failed: {0}")]
    ReloadFailed(#[source] ApiError),
}

/// Result type alias for `SyncError`.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Derived values
// =============================================================================

/// Display values for one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTotal {
    pub cart_item_id: CartItemId,
    pub quantity: i32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Values derived from the mirror, recomputed on demand and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSummary {
    /// Sum of all line quantities.
    pub item_count: i64,
    /// Price times quantity per line, in mirror order.
    pub lines: Vec<LineTotal>,
}

/// Derive the item count and line totals from a cart listing.
///
/// The grand total is deliberately absent: it always comes from the server.
#[must_use]
pub fn derive(items: &[CartItem]) -> CartSummary {
    CartSummary {
        item_count: items.iter().map(|item| i64::from(item.quantity)).sum(),
        lines: items
            .iter()
            .map(|item| LineTotal {
                cart_item_id: item.id,
                quantity: item.quantity,
                unit_price: item.product.price,
                line_total: item.line_total(),
            })
            .collect(),
    }
}

// =============================================================================
// Mutation tracking
// =============================================================================

/// Lifecycle state of cart mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Nothing in flight.
    Idle,
    /// At least one mutation request is awaiting its response.
    Pending,
    /// The server accepted the mutation and a refresh was triggered.
    Applied,
    /// The mutation failed; the mirror was left untouched.
    Failed,
}

/// Which cart mutation is being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Update,
    Remove,
}

/// Snapshot of the mutation tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    /// `Pending` while anything is in flight, `Idle` otherwise.
    pub state: MutationState,
    /// Number of mutation requests awaiting a response.
    pub in_flight: usize,
    /// How the most recently settled mutation ended (`Applied` or `Failed`).
    pub last_outcome: Option<(MutationKind, MutationState)>,
}

#[derive(Default)]
struct MutationTracker {
    in_flight: AtomicUsize,
    last_outcome: Mutex<Option<(MutationKind, MutationState)>>,
}

impl MutationTracker {
    fn begin(self: &Arc<Self>, kind: MutationKind) -> PendingMutation {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(?kind, in_flight, "mutation pending");
        PendingMutation {
            tracker: Arc::clone(self),
            kind,
        }
    }

    fn status(&self) -> SyncStatus {
        let in_flight = self.in_flight.load(Ordering::SeqCst);
        SyncStatus {
            state: if in_flight > 0 {
                MutationState::Pending
            } else {
                MutationState::Idle
            },
            in_flight,
            last_outcome: *self
                .last_outcome
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// A mutation in the `Pending` state.
///
/// Settling records the outcome. Dropping without settling (the caller
/// abandoned the future) returns the in-flight count to its previous value
/// and leaves the last outcome untouched.
struct PendingMutation {
    tracker: Arc<MutationTracker>,
    kind: MutationKind,
}

impl PendingMutation {
    fn settle(self, outcome: MutationState) {
        debug!(kind = ?self.kind, ?outcome, "mutation settled");
        *self
            .tracker
            .last_outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((self.kind, outcome));
    }
}

impl Drop for PendingMutation {
    fn drop(&mut self) {
        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// CartSync
// =============================================================================

/// Keeps the cart mirror in [`AppState`] consistent with the server cart.
pub struct CartSync<A> {
    api: A,
    state: AppState,
    tracker: Arc<MutationTracker>,
}

impl<A: CartApi> CartSync<A> {
    /// Create a cart mirror over `api` writing into `state`.
    #[must_use]
    pub fn new(api: A, state: AppState) -> Self {
        Self {
            api,
            state,
            tracker: Arc::default(),
        }
    }

    /// The backend this mirror talks to.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The state this mirror writes into.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Current mutation lifecycle status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.tracker.status()
    }

    /// A copy of the mirror.
    pub async fn snapshot(&self) -> CartSnapshot {
        self.state.cart().await
    }

    /// Derived values over the current mirror.
    pub async fn summary(&self) -> CartSummary {
        derive(&self.state.cart_items().await)
    }

    async fn signed_in_user(&self) -> SyncResult<User> {
        self.state.current_user().await.ok_or(SyncError::NotSignedIn)
    }

    /// Replace the mirror with the server's current cart.
    ///
    /// Fetches the listing and the server total, then applies both in one
    /// write. If the listing cannot be fetched the mirror is left as it was.
    /// If only the total fails, the listing is applied with an unknown total.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a network call when nobody is signed
    /// in, or the API error if the listing fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> SyncResult<()> {
        let user = self.signed_in_user().await?;

        let items = self.api.list_cart(user.id).await.inspect_err(|e| {
            warn!(user_id = %user.id, error = %e, "cart refresh failed; keeping previous mirror");
        })?;

        let total = match self.api.cart_total(user.id).await {
            Ok(total) => Some(total.total),
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "cart total unavailable");
                None
            }
        };

        let count = items.len();
        match self.state.replace_cart(user.id, items, total).await {
            Some(version) => debug!(user_id = %user.id, lines = count, version, "cart mirror replaced"),
            None => debug!(user_id = %user.id, "user changed during refresh; listing discarded"),
        }

        Ok(())
    }

    /// Add `quantity` of a product to the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a network call when nobody is signed
    /// in, the error of the add request, or `ReloadFailed` when the server
    /// accepted the add but the follow-up refresh failed.
    #[instrument(skip(self))]
    pub async fn add_item(&self, product_id: ProductId, quantity: i32) -> SyncResult<()> {
        let user = self.signed_in_user().await?;
        let request = AddToCartRequest {
            user_id: user.id,
            product_id,
            quantity,
        };

        self.mutate(MutationKind::Add, self.api.add_to_cart(request))
            .await
    }

    /// Set the quantity of a cart line.
    ///
    /// The quantity is forwarded as-is; the server decides what is valid and
    /// removes the line when it is zero or less.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a network call when nobody is signed
    /// in, the error of the update request, or `ReloadFailed` when only the
    /// follow-up refresh failed.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        cart_item_id: CartItemId,
        quantity: i32,
    ) -> SyncResult<()> {
        self.signed_in_user().await?;
        self.mutate(
            MutationKind::Update,
            self.api.update_cart_item(cart_item_id, quantity),
        )
        .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a network call when nobody is signed
    /// in, the error of the remove request, or `ReloadFailed` when only the
    /// follow-up refresh failed.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_item_id: CartItemId) -> SyncResult<()> {
        self.signed_in_user().await?;
        self.mutate(
            MutationKind::Remove,
            self.api.remove_cart_item(cart_item_id),
        )
        .await
    }

    /// Run one mutation through the lifecycle and refresh on success.
    async fn mutate(
        &self,
        kind: MutationKind,
        request: impl Future<Output = Result<(), ApiError>>,
    ) -> SyncResult<()> {
        let pending = self.tracker.begin(kind);

        match request.await {
            Ok(()) => pending.settle(MutationState::Applied),
            Err(e) => {
                warn!(?kind, error = %e, "cart mutation failed");
                pending.settle(MutationState::Failed);
                return Err(e.into());
            }
        }

        self.refresh().await.map_err(|e| match e {
            SyncError::Api(e) => SyncError::ReloadFailed(e),
            other => other,
        })
    }
}
