use chrono::NaiveDate;

use super::Availability;

/// Human readable availability, as shown on listing cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityInfo {
    pub label: String,
    pub description: String,
    pub formatted_date: Option<String>,
}

impl Availability {
    pub fn info(&self) -> AvailabilityInfo {
        match self {
            Availability::AvailableNow => AvailabilityInfo {
                label: "Available now".to_string(),
                description: "Move-in ready immediately.".to_string(),
                formatted_date: None,
            },
            Availability::NotAvailable => AvailabilityInfo {
                label: "Currently not available".to_string(),
                description: "Please reach out for future availability.".to_string(),
                formatted_date: None,
            },
            Availability::Date { date } => {
                let formatted = date.as_deref().and_then(format_availability_date);
                match formatted {
                    Some(formatted) => AvailabilityInfo {
                        label: format!("Available from {}", formatted),
                        description: format!("This property will be ready from {}.", formatted),
                        formatted_date: Some(formatted),
                    },
                    None => AvailabilityInfo {
                        label: "Available from date to be confirmed".to_string(),
                        description: "Select date pending confirmation.".to_string(),
                        formatted_date: None,
                    },
                }
            }
        }
    }
}

/// "2026-03-01" -> "Mar 1, 2026". Unparseable dates are shown as entered.
fn format_availability_date(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => Some(date.format("%b %-d, %Y").to_string()),
        Err(_) => Some(trimmed.to_string()),
    }
}

pub fn format_bedroom_label(bedrooms: u32, maids_room: bool) -> String {
    if maids_room {
        format!("{} Bedrooms + Maids", bedrooms)
    } else {
        format!("{} Bedrooms", bedrooms)
    }
}

/// Format a free-text price as whole dirhams, e.g. "15000000" -> "AED 15,000,000".
///
/// Text without a parseable number is returned trimmed.
pub fn format_currency_aed(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let digits: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return trimmed.to_string();
    }

    match digits.parse::<f64>() {
        Ok(amount) if amount.is_finite() => {
            format!("AED {}", group_thousands(amount.round() as u64))
        }
        _ => trimmed.to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
