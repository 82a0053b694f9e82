//! mockall mocks of the collaborator traits
//!
//! ```
//! use formsync_core::element::Element;
//! use formsync_forms::{ContentLookup, LabelContent};
//! use formsync_test::mock::MockContentLookup;
//!
//! let mut content = MockContentLookup::new();
//! content
//!     .expect_find_label()
//!     .times(1)
//!     .returning(|element| Ok(LabelContent::new(element.code())));
//!
//! let label = content.find_label(&Element::new("/a", "a")).unwrap();
//! assert_eq!(label.text, "a");
//! ```

use formsync_core::element::Element;
use formsync_core::error::CollaboratorResult;
use formsync_core::event::ValidationUpdate;
use formsync_core::validators::ValidatorSet;
use formsync_forms::collaborators::{
	ContentLookup as ContentLookupTrait, LabelContent, Transport as TransportTrait,
	ValidationUtils as ValidationUtilsTrait,
};
use formsync_forms::control::ControlHandle;
use mockall::mock;
use serde_json::Value;

mock! {
	/// Mock implementation of [`ContentLookupTrait`]
	pub ContentLookup {}

	impl ContentLookupTrait for ContentLookup {
		fn find_label(&self, element: &Element) -> CollaboratorResult<LabelContent>;
	}
}

mock! {
	/// Mock implementation of [`ValidationUtilsTrait`]
	pub ValidationUtils {}

	impl ValidationUtilsTrait for ValidationUtils {
		fn apply_element_style(&self, element: &Element) -> CollaboratorResult<bool>;
		fn rebind_validations(
			&self,
			control: &ControlHandle,
			groups: &[String],
			element: &Element,
		) -> CollaboratorResult<bool>;
		fn build_static_validations(&self, element: &Element) -> CollaboratorResult<ValidatorSet>;
		fn assess_control_validation(
			&self,
			event: &ValidationUpdate,
			control: &ControlHandle,
		) -> CollaboratorResult<()>;
	}
}

mock! {
	/// Mock implementation of [`TransportTrait`]
	pub Transport {}

	impl TransportTrait for Transport {
		fn post_state_change(&self, path: &str, kind: &str, payload: &str) -> CollaboratorResult<()>;
		fn post_action(
			&self,
			url: &str,
			headers: Option<http::HeaderMap>,
			payload: &Value,
			method: http::Method,
		) -> CollaboratorResult<()>;
	}
}
