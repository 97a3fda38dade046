//! Widget kinds.
//!
//! Forms are not rendered here; the widget only records how a field is
//! meant to be presented and whether it submits one value or many.

/// The kind of input a form field is presented with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    /// A single-line text input.
    TextInput,
    /// A masked password input.
    PasswordInput,
    /// A numeric input.
    NumberInput,
    /// An email input.
    EmailInput,
    /// A single checkbox.
    CheckboxInput,
    /// A date-time input.
    DateTimeInput,
    /// A drop-down with one selection.
    Select,
    /// A list box with several selections.
    SelectMultiple,
    /// A group of checkboxes, one per choice.
    CheckboxSelectMultiple,
}

impl WidgetType {
    /// Returns `true` if the widget submits several values under one name.
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::SelectMultiple | Self::CheckboxSelectMultiple)
    }

    /// Returns the HTML `type` attribute for `<input>` based widgets.
    pub const fn input_type(self) -> Option<&'static str> {
        match self {
            Self::TextInput => Some("text"),
            Self::PasswordInput => Some("password"),
            Self::NumberInput => Some("number"),
            Self::EmailInput => Some("email"),
            Self::CheckboxInput | Self::CheckboxSelectMultiple => Some("checkbox"),
            Self::DateTimeInput => Some("datetime-local"),
            Self::Select | Self::SelectMultiple => None,
        }
    }
}
