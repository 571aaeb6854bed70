use console::Style;
use shuntflow_core::diagnostics::FindingKind;
use shuntflow_core::series::StenosisCategory;
use shuntflow_core::session::SessionReport;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    ok: Style,
    warn: Style,
    danger: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            danger: Style::new().red().bold(),
            disabled: Style::new().dim().yellow(),
        }
    }

    fn category(&self, category: StenosisCategory) -> &Style {
        match category {
            StenosisCategory::None => &self.ok,
            StenosisCategory::Mild => &self.warn,
            StenosisCategory::Moderate | StenosisCategory::Severe => &self.danger,
        }
    }
}

pub fn print_session_summary(report: &SessionReport) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("ShuntFlow Report"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(16)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(report.frames_processed)
    );
    match report.duration_sec {
        Some(d) => println!(
            "  {:<14}{}",
            s.label.apply_to("Duration"),
            s.value.apply_to(format!("{d:.2} s"))
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Duration"),
            s.disabled.apply_to("unknown")
        ),
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Samples"),
        s.value.apply_to(report.samples.len())
    );
    println!();

    println!("  {}", s.header.apply_to("Sectors"));
    println!(
        "    {}",
        s.label.apply_to(format!(
            "{:>6} {:>8} {:>7} {:>8} {:>8} {:>6}",
            "Angle", "TAWSS", "OSI", "RRT", "MaxWSS", "Frame"
        ))
    );
    for r in &report.sectors {
        let line = format!(
            "{:>6} {:>8.2} {:>7.3} {:>8.3} {:>8.2} {:>6}",
            r.angle, r.tawss, r.osi, r.rrt, r.max_wss, r.max_frame
        );
        if r.tawss > 0.0 {
            println!("    {}", s.value.apply_to(line));
        } else {
            println!("    {}", s.disabled.apply_to(line));
        }
    }
    println!();

    let stenosis = &report.stenosis;
    let class = &stenosis.classification;
    println!("  {}", s.header.apply_to("Stenosis"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Grade"),
        s.category(class.category).apply_to(class.label())
    );
    match stenosis.features {
        Some(ref f) => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Corr"),
                s.value.apply_to(format!("{:.3}", f.corr))
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Lag"),
                s.value.apply_to(format!("{:.2} s", f.lag_sec))
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Sync peaks"),
                s.value.apply_to(f.simultaneous_peak_count)
            );
        }
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Features"),
            s.disabled.apply_to("not enough samples")
        ),
    }
    if let Some(score) = class.mild_score {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Score"),
            s.value.apply_to(format!("{score:.2}"))
        );
    }
    for line in &class.rule_trace {
        println!("      {}", s.label.apply_to(line));
    }
    println!();

    let diag = &report.diagnostics;
    println!("  {}", s.header.apply_to("Diagnostics"));
    println!("    {}", s.value.apply_to(&diag.sector_comment));
    println!("    {}", s.value.apply_to(&diag.trend_comment));
    for finding in &diag.findings {
        let style = match finding.kind {
            FindingKind::Normal => &s.ok,
            FindingKind::HighShear => &s.warn,
            FindingKind::Stagnation => &s.danger,
        };
        let frame = finding
            .frame
            .map(|f| format!(" (frame {f})"))
            .unwrap_or_default();
        println!(
            "    {} {}{}",
            style.apply_to(format!("[{}]", finding.kind)),
            finding.description,
            s.label.apply_to(frame)
        );
    }
    println!();
}
