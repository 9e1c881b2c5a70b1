//! # Checkout Wizard
//!
//! The three-step order entry flow. Reads the cart, collects address,
//! shipping and payment data, and on submission hands the order to the
//! [`OrderPlacement`] collaborator and empties the cart.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Wizard                                  │
//! │                                                                         │
//! │   begin(cart) ── cart empty? ──► Err(EmptyCart)                         │
//! │       │                                                                 │
//! │       ▼            next()             next()                            │
//! │  ┌──────────┐ ─────────────► ┌──────────┐ ─────────────► ┌──────────┐   │
//! │  │ Address  │                │ Shipping │                │ Payment  │   │
//! │  │  (1)     │ ◄───────────── │  (2)     │ ◄───────────── │  (3)     │   │
//! │  └──────────┘   previous()   └──────────┘   previous()   └──────────┘   │
//! │                                                                         │
//! │  submit() from any step:                                                │
//! │     validate ── errors ──► Err(Validation), step unchanged              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   Submitting ── placement fails ──► Editing, Err(OrderRejected)         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   clear cart ──► Submitted (terminal; further submits are no-ops)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Navigation is never gated on the current step's fields; validation only
//! blocks submission.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use storefront_core::validation::{
    validate_choice, validate_email, validate_min_length, validate_required, validate_selected,
    ValidationResult,
};
use storefront_core::{
    CheckoutField, CheckoutStep, PaymentMethod, ShippingMethod, ValidationError,
};

use crate::cart::CartEngine;
use crate::error::{SessionError, SessionResult};
use crate::observer::{Listener, Listeners, Observable, SubscriptionId};
use crate::order::{OrderConfirmation, OrderPlacement, OrderRequest, OrderSummary, Pricing};

// =============================================================================
// Form Fields
// =============================================================================

/// Raw form values, exactly as typed or selected.
///
/// Shipping and payment method are kept as strings so that a value outside
/// the closed set can be reported by `validate` instead of being lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub shipping_method: String,
    pub payment_method: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub cardholder_name: String,
}

impl Default for CheckoutFields {
    fn default() -> Self {
        CheckoutFields {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: String::new(),
            shipping_method: ShippingMethod::Standard.as_str().to_string(),
            payment_method: PaymentMethod::Card.as_str().to_string(),
            card_number: String::new(),
            expiry_date: String::new(),
            cvv: String::new(),
            cardholder_name: String::new(),
        }
    }
}

impl CheckoutFields {
    pub fn get(&self, field: CheckoutField) -> &str {
        match field {
            CheckoutField::FirstName => &self.first_name,
            CheckoutField::LastName => &self.last_name,
            CheckoutField::Email => &self.email,
            CheckoutField::Phone => &self.phone,
            CheckoutField::Address => &self.address,
            CheckoutField::City => &self.city,
            CheckoutField::PostalCode => &self.postal_code,
            CheckoutField::Country => &self.country,
            CheckoutField::ShippingMethod => &self.shipping_method,
            CheckoutField::PaymentMethod => &self.payment_method,
            CheckoutField::CardNumber => &self.card_number,
            CheckoutField::ExpiryDate => &self.expiry_date,
            CheckoutField::Cvv => &self.cvv,
            CheckoutField::CardholderName => &self.cardholder_name,
        }
    }

    fn slot_mut(&mut self, field: CheckoutField) -> &mut String {
        match field {
            CheckoutField::FirstName => &mut self.first_name,
            CheckoutField::LastName => &mut self.last_name,
            CheckoutField::Email => &mut self.email,
            CheckoutField::Phone => &mut self.phone,
            CheckoutField::Address => &mut self.address,
            CheckoutField::City => &mut self.city,
            CheckoutField::PostalCode => &mut self.postal_code,
            CheckoutField::Country => &mut self.country,
            CheckoutField::ShippingMethod => &mut self.shipping_method,
            CheckoutField::PaymentMethod => &mut self.payment_method,
            CheckoutField::CardNumber => &mut self.card_number,
            CheckoutField::ExpiryDate => &mut self.expiry_date,
            CheckoutField::Cvv => &mut self.cvv,
            CheckoutField::CardholderName => &mut self.cardholder_name,
        }
    }

    /// The selected shipping method, if the value is one of the known ones.
    pub fn shipping_method(&self) -> Option<ShippingMethod> {
        self.shipping_method.parse().ok()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method.parse().ok()
    }

    /// Runs the whole form schema. Returns one error per failing field.
    pub fn validate(&self) -> BTreeMap<CheckoutField, ValidationError> {
        let mut errors = BTreeMap::new();
        let mut check = |field: CheckoutField, result: ValidationResult<()>| {
            if let Err(err) = result {
                errors.insert(field, err);
            }
        };

        let min_lengths = [
            (CheckoutField::FirstName, 2),
            (CheckoutField::LastName, 2),
            (CheckoutField::Phone, 9),
            (CheckoutField::Address, 5),
            (CheckoutField::City, 2),
            (CheckoutField::PostalCode, 5),
        ];
        for (field, min) in min_lengths {
            check(field, validate_min_length(field, self.get(field), min));
        }
        check(
            CheckoutField::Country,
            validate_selected(CheckoutField::Country, &self.country, 2),
        );
        check(CheckoutField::Email, validate_email(&self.email));

        let shipping = ShippingMethod::ALL.map(|m| m.as_str());
        check(
            CheckoutField::ShippingMethod,
            validate_choice::<ShippingMethod>(
                CheckoutField::ShippingMethod,
                &self.shipping_method,
                &shipping,
            )
            .map(|_| ()),
        );

        let payment = PaymentMethod::ALL.map(|m| m.as_str());
        let method = validate_choice::<PaymentMethod>(
            CheckoutField::PaymentMethod,
            &self.payment_method,
            &payment,
        );
        if method == Ok(PaymentMethod::Card) {
            for field in CheckoutField::ALL.into_iter().filter(|f| f.is_card_detail()) {
                check(field, validate_required(field, self.get(field)));
            }
        }
        check(CheckoutField::PaymentMethod, method.map(|_| ()));

        errors
    }
}

// =============================================================================
// Wizard State
// =============================================================================

/// Where the wizard is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutPhase {
    Editing,
    /// The order is with the placement collaborator.
    Submitting,
    Submitted(OrderConfirmation),
}

/// What listeners receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutState {
    pub step: CheckoutStep,
    pub fields: CheckoutFields,
    pub field_errors: BTreeMap<CheckoutField, ValidationError>,
    pub phase: CheckoutPhase,
    /// Bumped on every published change.
    pub revision: u64,
}

impl CheckoutState {
    fn new() -> Self {
        CheckoutState {
            step: CheckoutStep::default(),
            fields: CheckoutFields::default(),
            field_errors: BTreeMap::new(),
            phase: CheckoutPhase::Editing,
            revision: 0,
        }
    }

    /// Message to show under a field, if it failed validation.
    pub fn error_message(&self, field: CheckoutField) -> Option<String> {
        self.field_errors.get(&field).map(ToString::to_string)
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, CheckoutPhase::Submitted(_))
    }
}

/// Result of a `submit` call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The order was accepted and the cart emptied.
    Placed(OrderConfirmation),
    /// The wizard had already submitted; nothing was sent.
    AlreadySubmitted,
    /// Another submit is still waiting on the order backend.
    InProgress,
}

struct CheckoutShared {
    state: Mutex<CheckoutState>,
    listeners: Listeners<CheckoutState>,
}

// =============================================================================
// Wizard
// =============================================================================

/// One checkout attempt. Dropped when the session navigates away.
#[derive(Clone)]
pub struct CheckoutWizard {
    cart: CartEngine,
    placement: Arc<dyn OrderPlacement>,
    pricing: Pricing,
    shared: Arc<CheckoutShared>,
}

impl std::fmt::Debug for CheckoutWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutWizard")
            .field("step", &self.step())
            .field("pricing", &self.pricing)
            .finish()
    }
}

impl CheckoutWizard {
    /// Starts checkout over `cart`.
    ///
    /// ## Errors
    /// `EmptyCart` if the cart has no lines; the caller should redirect
    /// back to the catalog instead.
    pub fn begin(
        cart: CartEngine,
        placement: Arc<dyn OrderPlacement>,
        pricing: Pricing,
    ) -> SessionResult<Self> {
        if cart.is_empty() {
            warn!("checkout refused: cart is empty");
            return Err(SessionError::EmptyCart);
        }

        info!(lines = cart.items().len(), total = %cart.get_total_price(), "checkout started");
        Ok(CheckoutWizard {
            cart,
            placement,
            pricing,
            shared: Arc::new(CheckoutShared {
                state: Mutex::new(CheckoutState::new()),
                listeners: Listeners::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CheckoutState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` while editing and notifies if it reports a change.
    fn edit<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut CheckoutState) -> bool,
    {
        let snapshot = {
            let mut state = self.lock();
            if state.phase != CheckoutPhase::Editing || !f(&mut state) {
                return false;
            }
            state.revision += 1;
            state.clone()
        };
        self.shared.listeners.notify(&snapshot);
        true
    }

    fn publish(&self, mut state: MutexGuard<'_, CheckoutState>) {
        state.revision += 1;
        let snapshot = state.clone();
        drop(state);
        self.shared.listeners.notify(&snapshot);
    }

    pub fn step(&self) -> CheckoutStep {
        self.lock().step
    }

    /// Moves forward one step, stopping at Payment.
    pub fn next(&self) -> CheckoutStep {
        self.move_to(CheckoutStep::next)
    }

    /// Moves back one step, stopping at Address.
    pub fn previous(&self) -> CheckoutStep {
        self.move_to(CheckoutStep::previous)
    }

    fn move_to(&self, f: fn(CheckoutStep) -> CheckoutStep) -> CheckoutStep {
        let mut from = CheckoutStep::default();
        let mut to = CheckoutStep::default();
        let moved = self.edit(|state| {
            from = state.step;
            state.step = f(state.step);
            to = state.step;
            from != to
        });
        if moved {
            debug!(from = from.title(), to = to.title(), "checkout step changed");
        }
        self.step()
    }

    /// Sets a field by its form name and clears any error shown for it.
    ///
    /// ## Errors
    /// `UnknownField` if `name` is not one of the form's fields.
    pub fn update_field(&self, name: &str, value: impl Into<String>) -> SessionResult<()> {
        let field: CheckoutField = name.parse()?;
        self.set_field(field, value);
        Ok(())
    }

    pub fn set_field(&self, field: CheckoutField, value: impl Into<String>) {
        let value = value.into();
        self.edit(|state| {
            let cleared = state.field_errors.remove(&field).is_some();
            let slot = state.fields.slot_mut(field);
            if *slot == value {
                return cleared;
            }
            *slot = value;
            true
        });
    }

    pub fn select_shipping(&self, method: ShippingMethod) {
        self.set_field(CheckoutField::ShippingMethod, method.as_str());
    }

    pub fn select_payment(&self, method: PaymentMethod) {
        self.set_field(CheckoutField::PaymentMethod, method.as_str());
    }

    pub fn fields(&self) -> CheckoutFields {
        self.lock().fields.clone()
    }

    pub fn field_errors(&self) -> BTreeMap<CheckoutField, ValidationError> {
        self.lock().field_errors.clone()
    }

    /// Runs the form schema and replaces the field errors. Returns true if
    /// the form is valid.
    pub fn validate(&self) -> bool {
        let mut state = self.lock();
        let errors = state.fields.validate();
        let valid = errors.is_empty();
        if state.field_errors != errors {
            state.field_errors = errors;
            self.publish(state);
        }
        valid
    }

    /// Prices the cart with the selected shipping method. An unrecognised
    /// method is priced as standard.
    pub fn order_summary(&self) -> OrderSummary {
        let method = self.lock().fields.shipping_method().unwrap_or_default();
        self.pricing.summarize(self.cart.get_total_price(), method)
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.lock().phase.clone()
    }

    pub fn is_submitted(&self) -> bool {
        self.lock().is_submitted()
    }

    pub fn confirmation(&self) -> Option<OrderConfirmation> {
        match &self.lock().phase {
            CheckoutPhase::Submitted(confirmation) => Some(confirmation.clone()),
            _ => None,
        }
    }

    /// Validates, places the order, then empties the cart.
    ///
    /// ## Errors
    /// - `Validation`: nothing was sent; per-field errors are set
    /// - `EmptyCart`: the cart was emptied after checkout began
    /// - `OrderRejected`: the backend refused; the cart is untouched and
    ///   the form stays editable
    pub async fn submit(&self) -> SessionResult<SubmitOutcome> {
        let items = self.cart.items();
        let request = {
            let mut state = self.lock();
            match state.phase {
                CheckoutPhase::Submitted(_) => return Ok(SubmitOutcome::AlreadySubmitted),
                CheckoutPhase::Submitting => return Ok(SubmitOutcome::InProgress),
                CheckoutPhase::Editing => {}
            }

            let errors = state.fields.validate();
            if !errors.is_empty() {
                let count = errors.len();
                let fields: Vec<&str> = errors.keys().map(CheckoutField::name).collect();
                warn!(count, ?fields, step = state.step.title(), "checkout validation failed");
                state.field_errors = errors;
                self.publish(state);
                return Err(SessionError::Validation { count });
            }
            let had_errors = !state.field_errors.is_empty();
            state.field_errors.clear();

            if items.is_empty() {
                warn!("checkout submit refused: cart is empty");
                if had_errors {
                    self.publish(state);
                }
                return Err(SessionError::EmptyCart);
            }

            let method = state.fields.shipping_method().unwrap_or_default();
            let subtotal = items.iter().map(|i| i.line_total()).sum();
            let request = OrderRequest {
                items,
                fields: state.fields.clone(),
                summary: self.pricing.summarize(subtotal, method),
            };
            state.phase = CheckoutPhase::Submitting;
            self.publish(state);
            request
        };

        info!(total = %request.summary.total, "placing order");
        let result = self.placement.place_order(&request).await;

        match result {
            Ok(confirmation) => {
                // cart listeners run here, without the wizard lock held
                self.cart.clear_cart();
                let mut state = self.lock();
                state.phase = CheckoutPhase::Submitted(confirmation.clone());
                info!(order_id = %confirmation.order_id, "checkout submitted");
                self.publish(state);
                Ok(SubmitOutcome::Placed(confirmation))
            }
            Err(err) => {
                let mut state = self.lock();
                state.phase = CheckoutPhase::Editing;
                warn!(error = %err, "order rejected");
                self.publish(state);
                Err(err.into())
            }
        }
    }
}

impl Observable for CheckoutWizard {
    type State = CheckoutState;

    fn snapshot(&self) -> CheckoutState {
        self.lock().clone()
    }

    fn on_change(&self, listener: Listener<CheckoutState>) -> SubscriptionId {
        self.shared.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.listeners.unsubscribe(id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
