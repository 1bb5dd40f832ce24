use cloudband_core::workflow::DetectionOutput;
use cloudband_core::DetectionParameters;
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
        }
    }
}

fn enabled(s: &Styles, on: bool) -> String {
    if on {
        s.method.apply_to("enabled").to_string()
    } else {
        s.disabled.apply_to("disabled").to_string()
    }
}

pub fn print_parameters(params: &DetectionParameters, domain: &str, timesteps: usize) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Cloud Band Detection"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(20)));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Domain"), s.value.apply_to(domain));
    println!("  {:<14}{}", s.label.apply_to("Timesteps"), s.value.apply_to(timesteps));
    println!();

    // Blobs
    println!("  {}", s.header.apply_to("Blobs"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Threshold"),
        s.method.apply_to(&params.threshold_method)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Min area"),
        s.value.apply_to(format!("{:.0} km2", params.area_threshold_km2))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Antimeridian"),
        enabled(&s, params.connect_antimeridian)
    );
    println!();

    // Acceptance
    println!("  {}", s.header.apply_to("Acceptance"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Angle"),
        s.value.apply_to(format!("({}, {}) deg", params.angle_min, params.angle_max))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Latitudes"),
        s.value.apply_to(format!(
            "top {} / bottom {}",
            params.top_latitude, params.bottom_latitude
        ))
    );
    println!();

    // Tracking
    if params.run_tracking {
        println!("  {}", s.header.apply_to("Tracking"));
        println!(
            "    {:<14}{}",
            s.label.apply_to("Overlap"),
            s.value.apply_to(format!("{:.0}%", params.overlap_fraction * 100.0))
        );
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Tracking"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();
}

pub fn print_detection_summary(output: &DetectionOutput) {
    let s = Styles::new();
    let days = output.cloud_bands.len();
    let active = output.cloud_bands.iter().filter(|d| !d.is_empty()).count();
    let linked = output
        .cloud_bands
        .iter()
        .flatten()
        .filter(|b| !b.parents.is_empty())
        .count();

    println!();
    println!("  {}", s.header.apply_to("Results"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Bands"),
        s.value.apply_to(output.band_count())
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Band days"),
        s.value.apply_to(format!("{active} / {days}"))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("With parents"),
        s.value.apply_to(linked)
    );
    if let Some(ref candidates) = output.candidates {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Candidates"),
            s.value.apply_to(candidates.iter().map(Vec::len).sum::<usize>())
        );
    }
}
