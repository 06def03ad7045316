use std::fmt;
use std::str::FromStr;

use dialoguer::{console::Term, theme::ColorfulTheme, Confirm, Input, Select};
use error_stack::{IntoReport, Report, Result, ResultExt};

#[derive(Debug)]
pub struct DialoguerError;

impl fmt::Display for DialoguerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dialoguer error")
    }
}

impl std::error::Error for DialoguerError {}

pub type DialoguerResult<T> = error_stack::Result<T, DialoguerError>;

#[derive(Debug, Clone)]
pub struct Dialoguer;

impl Dialoguer {
    pub fn select<T>(
        prompt_text: String,
        items: Vec<T>,
        default: Option<usize>,
    ) -> Result<usize, DialoguerError>
    where
        T: ToString + Clone,
    {
        let colorful_theme = &ColorfulTheme::default();
        let mut select = Select::with_theme(colorful_theme);
        let mut dialog = select.with_prompt(&prompt_text).items(&items);

        if let Some(def) = default {
            dialog = dialog.default(def);
        } else {
            dialog = dialog.default(0);
        }

        Ok(dialog
            .interact_on_opt(&Term::stderr())
            .into_report()
            .change_context(DialoguerError)?
            .ok_or(DialoguerError)
            .into_report()?)
    }

    pub fn confirm(prompt_text: String, default: Option<bool>) -> Result<bool, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut confirm = Confirm::with_theme(colorful_theme);
        let dialog = confirm
            .with_prompt(&prompt_text)
            .default(default.unwrap_or(false));

        Ok(dialog
            .interact_on_opt(&Term::stderr())
            .into_report()
            .change_context(DialoguerError)?
            .unwrap_or(false))
    }

    /// Fails with an `Aborted!` report unless the user confirms.
    pub fn confirm_or_abort(prompt_text: String) -> Result<(), DialoguerError> {
        if Self::confirm(prompt_text, None)? {
            Ok(())
        } else {
            Err(Report::new(DialoguerError).attach_printable("Aborted!"))
        }
    }

    pub fn input(prompt_text: String) -> Result<String, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut input = Input::with_theme(colorful_theme);
        let dialog: String = input
            .with_prompt(&prompt_text)
            .interact_text()
            .into_report()
            .change_context(DialoguerError)?;

        Ok(dialog)
    }

    /// Text input that may be left empty.
    pub fn optional_input(prompt_text: String) -> Result<String, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(colorful_theme);
        let dialog = input
            .with_prompt(&prompt_text)
            .allow_empty(true)
            .interact_text()
            .into_report()
            .change_context(DialoguerError)?;

        Ok(dialog)
    }

    /// Typed input, re-asked until `validate` accepts it.
    pub fn input_with_default<T, V>(
        prompt_text: String,
        default: Option<T>,
        mut validate: V,
    ) -> Result<T, DialoguerError>
    where
        T: Clone + ToString + FromStr,
        T::Err: fmt::Debug + ToString,
        V: FnMut(&T) -> std::result::Result<(), String>,
    {
        let colorful_theme = &ColorfulTheme::default();
        let mut input = Input::<T>::with_theme(colorful_theme);
        let mut dialog = input
            .with_prompt(&prompt_text)
            .validate_with(|value: &T| validate(value));
        if let Some(default) = default {
            dialog = dialog.default(default);
        }

        Ok(dialog
            .interact_text()
            .into_report()
            .change_context(DialoguerError)?)
    }
}
