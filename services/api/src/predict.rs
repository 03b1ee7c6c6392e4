use clap::{Args, ValueEnum};
use dairy_price::config::AppConfig;
use dairy_price::error::AppError;
use dairy_price::pricing::{
    AnimalIdentity, InferencePipeline, PregnancyAnswer, RawInput, ReportRecord,
};
use std::fmt::Write as _;

const REPORT_TITLE: &str = "Animal Price Prediction Report";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Breed of the animal (HF or JY)
    #[arg(long)]
    pub(crate) breed: String,
    /// Daily milk yield in liters (10-30)
    #[arg(long)]
    pub(crate) milk_yield: i64,
    /// Lactation number of the animal (0-3)
    #[arg(long)]
    pub(crate) parity_no: i64,
    /// Pregnancy status (yes or no)
    #[arg(long)]
    pub(crate) pregnant: String,
    /// Pregnancy trimester (1-3), required when pregnant
    #[arg(long)]
    pub(crate) trimester: Option<i64>,
    /// Farmer name printed on the report
    #[arg(long)]
    pub(crate) farmer_name: Option<String>,
    /// Parentage printed on the report
    #[arg(long)]
    pub(crate) parentage: Option<String>,
    /// Address printed on the report
    #[arg(long)]
    pub(crate) address: Option<String>,
    /// Ear tag number printed on the report
    #[arg(long)]
    pub(crate) tag_number: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
}

impl PredictArgs {
    fn raw_input(&self) -> RawInput {
        RawInput::new(
            self.breed.clone(),
            self.milk_yield,
            self.parity_no,
            PregnancyAnswer::Label(self.pregnant.clone()),
            self.trimester,
        )
        .with_identity(AnimalIdentity {
            farmer_name: self.farmer_name.clone(),
            parentage: self.parentage.clone(),
            address: self.address.clone(),
            tag_number: self.tag_number.clone(),
        })
    }
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let pipeline = InferencePipeline::load(&config.artifacts, &config.report)?;
    let record = pipeline.run(&args.raw_input())?;

    match args.format {
        OutputFormat::Text => print!("{}", render_report(&record)),
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&record)?;
            println!("{rendered}");
        }
    }

    Ok(())
}

/// Plain-text layout of the downloadable report; every record field is listed.
pub(crate) fn render_report(record: &ReportRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{REPORT_TITLE}");
    let _ = writeln!(out, "{}", "=".repeat(REPORT_TITLE.len()));
    if let Some(number) = record.report_number() {
        let _ = writeln!(out, "Report number: {number}");
    }
    let _ = writeln!(
        out,
        "Report generated on: {} (UTC{})",
        record.generated_at().format("%Y-%m-%d %H:%M:%S"),
        record.timezone()
    );

    let identity = record.identity();
    let identity_lines = [
        ("Farmer name", identity.farmer_name.as_deref()),
        ("Parentage", identity.parentage.as_deref()),
        ("Address", identity.address.as_deref()),
        ("Tag number", identity.tag_number.as_deref()),
    ];
    if identity_lines.iter().any(|(_, value)| value.is_some()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "Owner Details:");
        for (label, value) in identity_lines {
            if let Some(value) = value {
                let _ = writeln!(out, "  {label}: {value}");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Input Details:");
    let _ = writeln!(
        out,
        "  Animal Breed: {} (code {})",
        record.breed_label(),
        record.breed_code()
    );
    let _ = writeln!(out, "  Milk Yield: {} liters", record.milk_yield_liters());
    let _ = writeln!(out, "  Parity No: {}", record.parity_no());
    let _ = writeln!(
        out,
        "  Pregnancy Status: {} (code {})",
        record.pregnancy_label(),
        record.pregnancy_code()
    );
    let _ = writeln!(out, "  Pregnancy Trimester: {}", record.pregnancy_trimester());

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Predicted Price: {} {} (model score {:.2})",
        record.currency(),
        record.displayed_price(),
        record.raw_score()
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", record.courtesy());
    let _ = writeln!(out, "Disclaimer: {}", record.disclaimer());
    out
}
