//! `cfadmin status` command - Moderation dashboard

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_amount, open_project};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::project::Project;
use crate::entities::translation::coverage;
use crate::entities::withdrawal::RiskLevel;
use crate::entities::{
    Bank, Campaign, CampaignStatus, Language, Translation, Withdrawal, WithdrawalStatus,
};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Show only one section (campaigns, withdrawals, reference)
    #[arg(long)]
    pub section: Option<Section>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Section {
    Campaigns,
    Withdrawals,
    Reference,
}

#[derive(Serialize, Default, Debug, PartialEq)]
struct CampaignMetrics {
    total: usize,
    by_status: BTreeMap<String, usize>,
    awaiting_review: usize,
    featured: usize,
    total_goal: f64,
    total_raised: f64,
}

#[derive(Serialize, Default, Debug, PartialEq)]
struct WithdrawalMetrics {
    total: usize,
    by_status: BTreeMap<String, usize>,
    pending_amount: f64,
    high_risk_pending: usize,
}

#[derive(Serialize, Default, Debug, PartialEq)]
struct LanguageCoverage {
    code: String,
    name: String,
    translated: usize,
    total: usize,
    percent: u32,
}

#[derive(Serialize, Default, Debug, PartialEq)]
struct ReferenceMetrics {
    banks: usize,
    active_banks: usize,
    languages: usize,
    active_languages: usize,
    default_language: Option<String>,
    translation_keys: usize,
    coverage: Vec<LanguageCoverage>,
}

/// Sum of the parseable amounts; malformed values contribute nothing
fn sum_amounts(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| v.is_finite()).sum()
}

fn campaign_metrics(campaigns: &[Campaign]) -> CampaignMetrics {
    let mut by_status = BTreeMap::new();
    for c in campaigns {
        *by_status.entry(c.status.to_string()).or_insert(0) += 1;
    }
    CampaignMetrics {
        total: campaigns.len(),
        by_status,
        awaiting_review: campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::PendingApproval)
            .count(),
        featured: campaigns.iter().filter(|c| c.featured).count(),
        total_goal: sum_amounts(campaigns.iter().map(Campaign::goal)),
        total_raised: sum_amounts(campaigns.iter().map(Campaign::raised)),
    }
}

fn withdrawal_metrics(withdrawals: &[Withdrawal]) -> WithdrawalMetrics {
    let mut by_status = BTreeMap::new();
    for w in withdrawals {
        *by_status.entry(w.status.to_string()).or_insert(0) += 1;
    }
    let pending: Vec<&Withdrawal> = withdrawals
        .iter()
        .filter(|w| w.status == WithdrawalStatus::Pending)
        .collect();
    WithdrawalMetrics {
        total: withdrawals.len(),
        by_status,
        pending_amount: sum_amounts(pending.iter().map(|w| w.amount())),
        high_risk_pending: pending
            .iter()
            .filter(|w| w.risk_level() == Some(RiskLevel::High))
            .count(),
    }
}

fn reference_metrics(
    banks: &[Bank],
    languages: &[Language],
    translations: &[Translation],
) -> ReferenceMetrics {
    let per_language = languages
        .iter()
        .filter(|l| l.is_active)
        .map(|l| {
            let stats = coverage(translations, &l.id);
            LanguageCoverage {
                code: l.code.clone(),
                name: l.name.clone(),
                translated: stats.translated,
                total: stats.total,
                percent: stats.percent(),
            }
        })
        .collect();

    ReferenceMetrics {
        banks: banks.len(),
        active_banks: banks.iter().filter(|b| b.is_active).count(),
        languages: languages.len(),
        active_languages: languages.iter().filter(|l| l.is_active).count(),
        default_language: languages
            .iter()
            .find(|l| l.is_default)
            .map(|l| l.code.clone()),
        translation_keys: translations.len(),
        coverage: per_language,
    }
}

fn load<T: crate::core::Record>(project: &Project) -> Result<Vec<T>> {
    let store = project.store::<T>().map_err(|e| miette::miette!("{}", e))?;
    Ok(store.records().to_vec())
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;

    let campaigns = campaign_metrics(&load::<Campaign>(&project)?);
    let withdrawals = withdrawal_metrics(&load::<Withdrawal>(&project)?);
    let reference = reference_metrics(
        &load::<Bank>(&project)?,
        &load::<Language>(&project)?,
        &load::<Translation>(&project)?,
    );

    let show = |s: Section| args.section.map_or(true, |only| only == s);

    if global.format == OutputFormat::Json {
        let mut status = serde_json::Map::new();
        if show(Section::Campaigns) {
            status.insert("campaigns".into(), serde_json::to_value(&campaigns).into_diagnostic()?);
        }
        if show(Section::Withdrawals) {
            status.insert(
                "withdrawals".into(),
                serde_json::to_value(&withdrawals).into_diagnostic()?,
            );
        }
        if show(Section::Reference) {
            status.insert("reference".into(), serde_json::to_value(&reference).into_diagnostic()?);
        }
        let json = serde_json::to_string_pretty(&status).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    let markdown = global.format == OutputFormat::Md;
    let render = |builder: Builder| {
        let mut table = builder.build();
        if markdown {
            table.with(Style::markdown());
        } else {
            table.with(Style::rounded());
        }
        table.to_string()
    };

    if !global.quiet && !markdown {
        println!("{}", style("Moderation Status").bold().underlined());
        println!();
    }

    if show(Section::Campaigns) {
        let mut builder = Builder::default();
        builder.push_record(["Campaigns", "Count"]);
        for (status, count) in &campaigns.by_status {
            builder.push_record([status.clone(), count.to_string()]);
        }
        builder.push_record(["featured".to_string(), campaigns.featured.to_string()]);
        builder.push_record(["total".to_string(), campaigns.total.to_string()]);
        println!("{}", render(builder));
        println!(
            "Awaiting review: {}   Raised {} of {}",
            style(campaigns.awaiting_review).yellow(),
            format_amount(campaigns.total_raised),
            format_amount(campaigns.total_goal)
        );
        println!();
    }

    if show(Section::Withdrawals) {
        let mut builder = Builder::default();
        builder.push_record(["Withdrawals", "Count"]);
        for (status, count) in &withdrawals.by_status {
            builder.push_record([status.clone(), count.to_string()]);
        }
        builder.push_record(["total".to_string(), withdrawals.total.to_string()]);
        println!("{}", render(builder));
        let high_risk = if withdrawals.high_risk_pending > 0 {
            style(withdrawals.high_risk_pending).red().bold()
        } else {
            style(withdrawals.high_risk_pending).green()
        };
        println!(
            "Pending payouts: {}   High risk: {}",
            format_amount(withdrawals.pending_amount),
            high_risk
        );
        println!();
    }

    if show(Section::Reference) {
        let mut builder = Builder::default();
        builder.push_record(["Language", "Translated", "Coverage"]);
        for lang in &reference.coverage {
            let marker = if reference.default_language.as_deref() == Some(lang.code.as_str()) {
                " *"
            } else {
                ""
            };
            builder.push_record([
                format!("{} ({}){}", lang.name, lang.code, marker),
                format!("{}/{}", lang.translated, lang.total),
                format!("{}%", lang.percent),
            ]);
        }
        println!("{}", render(builder));
        println!(
            "Banks: {}/{} active   Languages: {}/{} active   Keys: {}",
            reference.active_banks,
            reference.banks,
            reference.active_languages,
            reference.languages,
            reference.translation_keys
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_campaign_metrics() {
        let campaigns: Vec<Campaign> = serde_json::from_value(json!([
            {"id": "1", "status": "pending_approval", "goalAmount": "1000", "raisedAmount": "250"},
            {"id": "2", "status": "active", "goalAmount": "abc", "raisedAmount": 100, "featured": true},
            {"id": "3", "status": "active", "goalAmount": 500}
        ]))
        .unwrap();
        let m = campaign_metrics(&campaigns);
        assert_eq!(m.total, 3);
        assert_eq!(m.awaiting_review, 1);
        assert_eq!(m.featured, 1);
        assert_eq!(m.by_status.get("active"), Some(&2));
        assert_eq!(m.total_goal, 1500.0);
        assert_eq!(m.total_raised, 350.0);
    }

    #[test]
    fn test_withdrawal_metrics() {
        let withdrawals: Vec<Withdrawal> = serde_json::from_value(json!([
            {"id": "w1", "status": "pending", "amount": "1200.50", "riskScore": 85},
            {"id": "w2", "status": "pending", "amount": "300", "riskScore": 10},
            {"id": "w3", "status": "approved", "amount": "9000", "riskScore": 90}
        ]))
        .unwrap();
        let m = withdrawal_metrics(&withdrawals);
        assert_eq!(m.total, 3);
        assert_eq!(m.pending_amount, 1500.5);
        assert_eq!(m.high_risk_pending, 1);
        assert_eq!(m.by_status.get("pending"), Some(&2));
    }

    #[test]
    fn test_reference_metrics_coverage_for_active_languages() {
        let languages: Vec<Language> = serde_json::from_value(json!([
            {"id": "en", "name": "English", "code": "en", "is_active": true, "is_default": true},
            {"id": "fr", "name": "French", "code": "fr", "is_active": true},
            {"id": "de", "name": "German", "code": "de", "is_active": false}
        ]))
        .unwrap();
        let translations: Vec<Translation> = serde_json::from_value(json!([
            {"id": "t1", "key": "a.b", "translations": [
                {"language_id": "en", "translation": "Hello"},
                {"language_id": "fr", "translation": "Bonjour"}
            ]},
            {"id": "t2", "key": "a.c", "translations": [
                {"language_id": "en", "translation": "Bye"},
                {"language_id": "fr", "translation": "  "}
            ]}
        ]))
        .unwrap();
        let m = reference_metrics(&[], &languages, &translations);
        assert_eq!(m.active_languages, 2);
        assert_eq!(m.default_language.as_deref(), Some("en"));
        assert_eq!(m.coverage.len(), 2);
        assert_eq!(m.coverage[0].percent, 100);
        assert_eq!(m.coverage[1].translated, 1);
        assert_eq!(m.coverage[1].percent, 50);
    }
}
