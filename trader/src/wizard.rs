//! Console selection wizard.
//!
//! Drives [`SelectionFlow`] and the order prompts through a [`Prompter`], so
//! sessions can be scripted in tests and rendered with `dialoguer` on a
//! terminal.

use contractbook::{Catalog, DurationValue, SelectionFlow, SelectionInput, TradeSelection};
use dialoguer::{Confirm, Input, Select};
use log::warn;

use crate::contract::{BarrierKind, Barriers, ContractType, ModalityContracts};
use crate::error::{Error, Result};

/// Interactive input.
pub trait Prompter {
    /// Pick one of `items`. `None` when the user backs out (Esc/q).
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<Option<usize>>;

    /// Free text, with an optional default shown to the user.
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String>;

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
}

/// Terminal prompts via `dialoguer`.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

/// Walk market → submarket → symbol → group → modality.
///
/// Returns `None` when the user cancels. Closed entries are listed with a
/// `(closed)` marker and stay selectable.
pub fn select_trade(catalog: &Catalog, prompter: &mut dyn Prompter) -> Result<Option<TradeSelection>> {
    let mut flow = SelectionFlow::new(catalog);
    while !flow.is_finished() {
        let choices = flow.choices();
        if choices.is_empty() {
            return Err(Error::Aborted(format!(
                "nothing to choose at step '{}'",
                flow.state().prompt()
            )));
        }
        let items: Vec<String> = choices.iter().map(ToString::to_string).collect();
        let input = match prompter.select(flow.state().prompt(), &items)? {
            Some(index) => match choices.get(index) {
                Some(choice) => SelectionInput::Choose(choice.value.clone()),
                None => {
                    warn!("Choice {index} is out of range, asking again");
                    continue;
                }
            },
            None => SelectionInput::Cancel,
        };
        if let Err(e) = flow.advance(input) {
            warn!("{e}, asking again");
        }
    }
    Ok(flow.selection().cloned())
}

/// Pick the direction (contract type) of the selected modality.
pub fn select_contract(
    contracts: &ModalityContracts,
    prompter: &mut dyn Prompter,
) -> Result<Option<&'static ContractType>> {
    let items: Vec<String> = contracts.types.iter().map(ToString::to_string).collect();
    Ok(prompter
        .select("Direction", &items)?
        .and_then(|index| contracts.types.get(index)))
}

/// Ask for a duration until a valid token is given.
pub fn ask_duration(prompter: &mut dyn Prompter, default: &DurationValue) -> Result<DurationValue> {
    let default = default.to_token();
    loop {
        let answer = prompter.input("Duration (e.g. 5t, 30s, 15m, 1h, 1d)", Some(&default))?;
        let token = if answer.trim().is_empty() {
            default.as_str()
        } else {
            answer.trim()
        };
        match DurationValue::parse(token) {
            Ok(value) => return Ok(value),
            Err(e) => warn!("{e}, asking again"),
        }
    }
}

/// Ask for whatever barriers the contract takes.
pub fn ask_barriers(prompter: &mut dyn Prompter, kind: BarrierKind) -> Result<Barriers> {
    let mut ask = |prompt: &str| -> Result<Option<String>> {
        let answer = prompter.input(prompt, None)?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    };
    Ok(match kind {
        BarrierKind::None => Barriers::default(),
        BarrierKind::Single => Barriers {
            barrier: ask("Barrier (absolute, or offset like +0.5)")?,
            barrier2: None,
        },
        BarrierKind::Double => Barriers {
            barrier: ask("High barrier")?,
            barrier2: ask("Low barrier")?,
        },
        BarrierKind::Digit => Barriers {
            barrier: ask("Last digit prediction (0-9)")?,
            barrier2: None,
        },
    })
}
