//! Direct-message copy rendered from embedded templates.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::decision::FINAL_WARNING_LEVEL;
use crate::core::types::{Decision, Member};

const WARNING_TEMPLATE: &str = include_str!("templates/warning.md");
const DEACTIVATION_TEMPLATE: &str = include_str!("templates/deactivation.md");
const THANK_YOU_TEMPLATE: &str = include_str!("templates/thank_you.md");
const ADMIN_FINAL_WARNING_TEMPLATE: &str = include_str!("templates/admin_final_warning.md");
const ADMIN_DEACTIVATION_TEMPLATE: &str = include_str!("templates/admin_deactivation.md");
const ADMIN_ANOMALY_TEMPLATE: &str = include_str!("templates/admin_anomaly.md");

/// Which admin alert to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAlert {
    FinalWarning,
    Deactivation,
    Anomaly,
}

impl AdminAlert {
    fn template(self) -> &'static str {
        match self {
            AdminAlert::FinalWarning => "admin_final_warning",
            AdminAlert::Deactivation => "admin_deactivation",
            AdminAlert::Anomaly => "admin_anomaly",
        }
    }
}

/// Template engine wrapper around minijinja.
pub struct MessageRenderer {
    env: Environment<'static>,
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        for (name, source) in [
            ("warning", WARNING_TEMPLATE),
            ("deactivation", DEACTIVATION_TEMPLATE),
            ("thank_you", THANK_YOU_TEMPLATE),
            ("admin_final_warning", ADMIN_FINAL_WARNING_TEMPLATE),
            ("admin_deactivation", ADMIN_DEACTIVATION_TEMPLATE),
            ("admin_anomaly", ADMIN_ANOMALY_TEMPLATE),
        ] {
            env.add_template(name, source)
                .expect("message template should be valid");
        }
        Self { env }
    }

    pub fn warning(&self, member: &Member, level: u32) -> Result<String> {
        let template = self.env.get_template("warning")?;
        Ok(template.render(context! {
            name => display_name(member),
            level => level,
            final_level => FINAL_WARNING_LEVEL,
        })?)
    }

    pub fn deactivation(&self, member: &Member) -> Result<String> {
        let template = self.env.get_template("deactivation")?;
        Ok(template.render(context! {
            name => display_name(member),
            final_level => FINAL_WARNING_LEVEL,
        })?)
    }

    pub fn thank_you(&self, member: &Member) -> Result<String> {
        let template = self.env.get_template("thank_you")?;
        Ok(template.render(context! { name => display_name(member) })?)
    }

    pub fn admin_alert(
        &self,
        alert: AdminAlert,
        member: &Member,
        decision: &Decision,
    ) -> Result<String> {
        let template = self.env.get_template(alert.template())?;
        Ok(template.render(context! {
            name => display_name(member),
            email => member.email.as_str(),
            level => decision.warning_level,
            reason => decision.reason.as_str(),
        })?)
    }
}

fn display_name(member: &Member) -> &str {
    let name = member.name.trim();
    if name.is_empty() { "there" } else { name }
}
