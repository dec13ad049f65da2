//! Server-rendered pages of the prediction form.
use maud::{html, Markup, DOCTYPE};

use homeval_core::manifest::FeatureRecord;

/// How a single manifest feature is entered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputKind {
    Integer { min: i64, max: i64, default: i64 },
    Slider { min: i64, max: i64, default: i64 },
    Decimal { min: f64, step: f64, default: f64 },
}

impl InputKind {
    pub fn for_feature(identifier: &str) -> Self {
        match identifier {
            "YearBuilt" => InputKind::Integer {
                min: 1800,
                max: 2026,
                default: 1980,
            },
            "OverallQual" => InputKind::Slider {
                min: 1,
                max: 10,
                default: 5,
            },
            "GarageCars" => InputKind::Integer {
                min: 0,
                max: 5,
                default: 0,
            },
            _ => InputKind::Decimal {
                min: 0.0,
                step: 100.0,
                default: 0.0,
            },
        }
    }

    pub fn default_value(&self) -> f64 {
        match *self {
            InputKind::Integer { default, .. } | InputKind::Slider { default, .. } => {
                default as f64
            }
            InputKind::Decimal { default, .. } => default,
        }
    }

    /// Summary-table rendering: whole numbers for integer inputs, two
    /// decimals otherwise.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            InputKind::Integer { .. } | InputKind::Slider { .. } => {
                format!("{}", value.round() as i64)
            }
            InputKind::Decimal { .. } => format!("{:.2}", value),
        }
    }
}

pub fn field_name(position: usize) -> String {
    format!("feature_{}", position)
}

/// `1234567.891` -> `1,234,567.89`.
pub fn format_price(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

fn layout(body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="pt-BR" {
            head {
                meta charset="utf-8";
                title { "Predição de Preços" }
                style {
                    "body { font-family: sans-serif; max-width: 960px; margin: 2em auto; }
                    .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 1em; }
                    .info { background: #e8f1fb; padding: 0.6em; border-radius: 4px; }
                    .error { background: #fdecea; color: #8a1c1c; padding: 0.6em; border-radius: 4px; }
                    .success { background: #e7f6ea; padding: 0.6em; border-radius: 4px; font-size: 1.2em; }
                    table { border-collapse: collapse; margin-top: 1em; }
                    td, th { border: 1px solid #ccc; padding: 0.3em 0.8em; }"
                }
            }
            body {
                h1 { "PREDIÇÃO DE PREÇO DE IMÓVEL" }
                p { "Insira as características do imóvel para obter uma previsão de preço" }
                (body)
            }
        }
    }
}

fn input_field(position: usize, record: &FeatureRecord, value: Option<f64>) -> Markup {
    let kind = InputKind::for_feature(&record.identifier);
    let name = field_name(position);
    let current = value.unwrap_or_else(|| kind.default_value());
    html! {
        label {
            (record.label())
            br;
            @match kind {
                InputKind::Integer { min, max, .. } => {
                    input type="number" name=(name) min=(min) max=(max) step="1"
                        value=(current.round() as i64);
                }
                InputKind::Slider { min, max, .. } => {
                    input type="range" name=(name) min=(min) max=(max) step="1"
                        value=(current.round() as i64);
                }
                InputKind::Decimal { min, step, .. } => {
                    input type="number" name=(name) min=(min) step=(step) value=(current);
                }
            }
        }
    }
}

/// The input form, one field per manifest feature in manifest order.
pub fn form_page(records: &[FeatureRecord], values: Option<&[f64]>, notice: Option<Markup>) -> Markup {
    layout(html! {
        div class="info" {
            "Utilizando os " (records.len()) " atributos mais importantes para a previsão"
        }
        hr;
        h2 { "Características do Imóvel" }
        form method="post" action="/predict" {
            div class="grid" {
                @for (i, record) in records.iter().enumerate() {
                    (input_field(i, record, values.and_then(|v| v.get(i).copied())))
                }
            }
            hr;
            button type="submit" { "Gerar Previsão" }
        }
        @if let Some(notice) = notice {
            (notice)
        }
    })
}

pub fn result_notice(records: &[FeatureRecord], values: &[f64], prediction: f64) -> Markup {
    html! {
        div class="success" {
            "Preço Estimado: " strong { "R$ " (format_price(prediction)) }
        }
        details open {
            summary { "Resumo dos Atributos" }
            table {
                tr { th { "Atributo" } th { "Valor" } }
                @for (record, value) in records.iter().zip(values) {
                    tr {
                        td { (record.label()) }
                        td { (InputKind::for_feature(&record.identifier).format_value(*value)) }
                    }
                }
            }
        }
    }
}

pub fn error_notice(message: &str) -> Markup {
    html! {
        div class="error" { (message) }
    }
}

/// Shown instead of the form when no manifest could be found.
pub fn missing_manifest_page() -> Markup {
    layout(error_notice(
        "Configuração de features não encontrada. Execute o treinamento do modelo primeiro!",
    ))
}
