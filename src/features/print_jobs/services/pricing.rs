//! Page estimation and print cost calculation

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::config::PricingConfig;

const BYTES_PER_KB: u64 = 1024;
const PDF_KB_PER_PAGE: u64 = 100;
const WORD_KB_PER_PAGE: u64 = 50;

/// Estimate the page count of an uploaded document.
///
/// This is an approximation from the file size only; documents are never parsed.
/// Images count as one page, PDFs as one page per 100 KB and Word documents as
/// one page per 50 KB (rounded up). Every file counts as at least one page.
pub fn estimate_pages(extension: &str, byte_size: u64) -> u32 {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "png" => 1,
        "pdf" => pages_by_size(byte_size, PDF_KB_PER_PAGE),
        "doc" | "docx" => pages_by_size(byte_size, WORD_KB_PER_PAGE),
        _ => 1,
    }
}

fn pages_by_size(byte_size: u64, kb_per_page: u64) -> u32 {
    let bytes_per_page = BYTES_PER_KB * kb_per_page;
    let pages = byte_size.div_ceil(bytes_per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Prices a job from its page total and print options
#[derive(Debug, Clone)]
pub struct CostCalculator {
    config: PricingConfig,
}

impl CostCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// `pages × copies × rate`, discounted for duplex, rounded half away from zero
    /// to the configured currency scale.
    pub fn cost(&self, total_pages: u32, copies: u32, is_color: bool, is_double_sided: bool) -> Decimal {
        let rate = if is_color {
            self.config.color_rate
        } else {
            self.config.mono_rate
        };

        let mut total = Decimal::from(total_pages) * Decimal::from(copies) * rate;
        if is_double_sided {
            total *= self.config.duplex_factor;
        }

        total.round_dp_with_strategy(
            self.config.currency_scale,
            RoundingStrategy::MidpointAwayFromZero,
        )
    }
}
