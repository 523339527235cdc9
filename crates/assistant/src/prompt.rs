use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context as _, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tera::{Context, Tera};

use storefront_core::ranking::RankedShortlist;

const SHOPPING_PROMPT: &str = "shopping_prompt.txt";

const SHOPPING_PROMPT_TEMPLATE: &str = r#"You are an AI shopping assistant.

User question:
"{{ question }}"

IMPORTANT CONTEXT (DO NOT GUESS):
- User budget: {% if budget %}{{ budget | money }} USD{% else %}Not specified{% endif %}
- Products listed below are the ONLY products you may recommend
- Prices are FINAL and in USD

Products:
{% for product in products -%}
- #{{ product.id }} {{ product.title }} ({{ product.category }}) {{ product.price | money }}
{% endfor %}
Instructions:
- Answer naturally and helpfully
- Recommend only from the listed products
- Respect the budget if one is given
- Mention the category if relevant
- NEVER invent products or prices
"#;

#[derive(Serialize)]
struct PromptProduct<'a> {
    id: i64,
    title: &'a str,
    category: &'a str,
    price: String,
}

/// Renders the shortlist into the prompt sent to the model.
pub struct PromptRenderer {
    tera: Tera,
}

impl PromptRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.register_filter("money", money_filter);
        tera.add_raw_template(SHOPPING_PROMPT, SHOPPING_PROMPT_TEMPLATE)
            .context("failed to register shopping prompt template")?;
        Ok(Self { tera })
    }

    pub fn render(&self, question: &str, shortlist: &RankedShortlist) -> Result<String> {
        let products: Vec<PromptProduct<'_>> = shortlist
            .products()
            .map(|product| PromptProduct {
                id: product.id.0,
                title: &product.title,
                category: &product.category,
                price: product.price.to_string(),
            })
            .collect();

        let mut context = Context::new();
        context.insert("question", question.trim());
        let budget = shortlist.signals.budget_ceiling.map(|ceiling| ceiling.to_string());
        context.insert("budget", &budget);
        context.insert("products", &products);

        self.tera.render(SHOPPING_PROMPT, &context).context("failed to render shopping prompt")
    }
}

/// `$12.50` style formatting, half-up to cents.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}

fn money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::String(raw) => Decimal::from_str(raw.trim())
            .map_err(|error| tera::Error::msg(format!("money filter expects a decimal: {error}")))?,
        tera::Value::Number(number) => number
            .as_f64()
            .and_then(Decimal::from_f64_retain)
            .ok_or_else(|| tera::Error::msg("money filter expects a finite number"))?,
        _ => return Err(tera::Error::msg("money filter expects a string or number")),
    };
    Ok(tera::Value::String(format_money(amount)))
}
