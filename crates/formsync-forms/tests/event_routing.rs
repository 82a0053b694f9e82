//! Event routing between the bus and bound controls

use chrono::{TimeZone, Utc};
use formsync_core::element::{Element, UiAttributes};
use formsync_core::event::{EventKind, StateUpdate, ValidationUpdate};
use formsync_core::value::ControlValue;
use formsync_forms::{BindingState, ControlStatus, SyncError};
use formsync_test::fixtures::{SyncHarness, harness, qty_element};
use proptest::prelude::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn test_order_qty_scenario(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let (binding, control) = harness.bind(qty_element).unwrap();

	// Act
	harness
		.bus
		.publish(StateUpdate::new("/order/qty", "qty", Some(json!(10))))
		.unwrap();
	harness
		.bus
		.publish(ValidationUpdate::new("/order/qty", "qty", true).with_groups(["required", "max100"]))
		.unwrap();

	// Assert
	assert_eq!(control.value(), ControlValue::from(json!(10)));
	assert_eq!(control.validators().names(), vec!["required", "max100"]);
	assert_eq!(binding.validators().names(), vec!["required", "max100"]);
	assert!(!binding.is_disabled());
	assert!(!control.is_disabled());
	assert!(binding.required_css());
	assert_eq!(control.status(), ControlStatus::Valid);
}

#[rstest]
fn test_value_above_dynamic_max_is_invalid(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let (_binding, control) = harness.bind(qty_element).unwrap();
	harness
		.bus
		.publish(ValidationUpdate::new("/order/qty", "qty", true).with_groups(["max100"]))
		.unwrap();

	// Act
	harness
		.bus
		.publish(StateUpdate::new("/order/qty", "qty", Some(json!(150))))
		.unwrap();

	// Assert
	assert_eq!(control.status(), ControlStatus::Invalid);
	assert_eq!(control.errors()[0].rule, "max100");
}

#[rstest]
fn test_null_leaf_state_resets_control(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let (binding, control) = harness.bind(qty_element).unwrap();
	control.input(json!(0)).unwrap();
	assert!(control.is_dirty());
	assert!(!control.errors().is_empty());

	// Act
	harness
		.bus
		.publish(StateUpdate::new("/order/qty", "qty", None))
		.unwrap();

	// Assert
	assert!(control.value().is_null());
	assert!(control.is_pristine());
	assert!(!control.is_touched());
	assert!(control.errors().is_empty());
	assert_eq!(binding.element().leaf_state, None);
}

#[rstest]
#[case(Some("Calendar"), None)]
#[case(None, Some("Calendar"))]
fn test_calendar_values_are_coerced_to_dates(
	harness: SyncHarness,
	#[case] event_alias: Option<&str>,
	#[case] element_alias: Option<&str>,
) {
	// Arrange
	let mut element = Element::new("/order/date", "date");
	if let Some(alias) = element_alias {
		element = element.with_attributes(UiAttributes::with_alias(alias));
	}
	let (binding, control) = harness.bind(element).unwrap();
	let mut update = StateUpdate::new("/order/date", "date", Some(json!("2024-03-01T10:00:00Z")));
	if let Some(alias) = event_alias {
		update = update.with_alias(alias);
	}

	// Act
	harness.bus.publish(update).unwrap();

	// Assert
	let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
	assert_eq!(control.value().as_date(), Some(&expected));
	assert_eq!(
		binding.element().leaf_state,
		Some(json!("2024-03-01T10:00:00.000Z"))
	);
}

#[rstest]
fn test_empty_groups_restore_exact_static_set(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let (binding, control) = harness.bind(qty_element).unwrap();
	harness
		.bus
		.publish(ValidationUpdate::new("/order/qty", "qty", true).with_groups(["required", "max100"]))
		.unwrap();

	// Act
	harness
		.bus
		.publish(ValidationUpdate::new("/order/qty", "qty", true).with_groups(Vec::<String>::new()))
		.unwrap();

	// Assert
	assert_eq!(control.validators().names(), vec!["min"]);
	assert_eq!(binding.validators().names(), vec!["min"]);
	assert!(!binding.is_required());
}

#[rstest]
fn test_other_paths_do_not_reach_binding(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let (_binding, control) = harness.bind(qty_element).unwrap();

	// Act
	let reached = harness
		.bus
		.publish(StateUpdate::new("/order/price", "qty", Some(json!(10))))
		.unwrap();

	// Assert
	assert_eq!(reached, 0);
	assert!(control.value().is_null());
}

#[rstest]
fn test_bindings_on_sibling_paths_are_isolated(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let (_qty, qty_control) = harness.bind(qty_element).unwrap();
	let (_price, price_control) = harness.bind(Element::new("/order/price", "price")).unwrap();

	// Act
	harness
		.bus
		.publish(StateUpdate::new("/order/price", "price", Some(json!(9.5))))
		.unwrap();

	// Assert
	assert_eq!(price_control.value(), ControlValue::from(json!(9.5)));
	assert!(qty_control.value().is_null());
}

#[rstest]
fn test_degraded_binding_ignores_events(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let binding = harness.bind_degraded(qty_element).unwrap();

	// Act
	let reached = harness
		.bus
		.publish(StateUpdate::new("/order/qty", "qty", Some(json!(1))))
		.unwrap();

	// Assert
	assert_eq!(binding.state(), BindingState::Degraded);
	assert_eq!(reached, 0);
	assert_eq!(binding.label(), "Quantity");
	assert_eq!(binding.help_text().as_deref(), Some("Units to order"));
}

#[rstest]
fn test_teardown_leaves_no_subscriptions(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let (binding, control) = harness.bind(qty_element).unwrap();
	assert_eq!(harness.bus.total_subscribers(), 2);

	// Act
	binding.detach();

	// Assert
	for kind in EventKind::ALL {
		assert_eq!(harness.bus.subscriber_count(kind), 0);
	}
	assert_eq!(control.listener_count(), 0);
	assert!(harness.form.resolver().is_empty());

	// Events after teardown are no-ops
	harness
		.bus
		.publish(StateUpdate::new("/order/qty", "qty", Some(json!(5))))
		.unwrap();
	assert!(control.value().is_null());
}

#[rstest]
fn test_rebinding_after_teardown(harness: SyncHarness, qty_element: Element) {
	// Arrange
	let (first, control) = harness.bind(qty_element.clone()).unwrap();
	drop(first);

	// Act
	let second = formsync_forms::ControlBinding::bind(
		qty_element,
		harness.services.clone(),
		Some(harness.form.clone()),
	)
	.unwrap();
	harness
		.bus
		.publish(StateUpdate::new("/order/qty", "qty", Some(json!(3))))
		.unwrap();

	// Assert
	assert_eq!(second.state(), BindingState::Bound);
	assert_eq!(control.value(), ControlValue::from(json!(3)));
	assert_eq!(harness.bus.total_subscribers(), 2);
}

#[rstest]
fn test_invalid_date_is_reported_through_publish(harness: SyncHarness) {
	// Arrange
	let element = Element::new("/order/date", "date").with_attributes(UiAttributes::with_alias("Calendar"));
	let (_binding, control) = harness.bind(element).unwrap();

	// Act
	let err = harness
		.bus
		.publish(StateUpdate::new("/order/date", "date", Some(json!("not a date"))))
		.unwrap_err();

	// Assert
	assert!(matches!(SyncError::from(err), SyncError::Coercion(_)));
	assert!(control.value().is_null());
}

proptest! {
	#[test]
	fn prop_events_for_other_paths_are_noops(
		segment in "[a-z]{1,8}",
		value in any::<i64>(),
		enabled in any::<bool>(),
	) {
		prop_assume!(segment != "qty");
		let harness = harness();
		let (binding, control) = harness.bind(qty_element()).unwrap();
		let before_validators = control.validators();
		let path = format!("/order/{}", segment);

		harness.bus.publish(StateUpdate::new(path.clone(), "qty", Some(json!(value)))).unwrap();
		harness.bus.publish(ValidationUpdate::new(path, "qty", enabled).with_groups(["required"])).unwrap();

		prop_assert!(control.value().is_null());
		prop_assert_eq!(control.validators(), before_validators);
		prop_assert!(!binding.is_disabled());
		prop_assert_eq!(binding.element().leaf_state, None);
	}
}
