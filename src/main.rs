//! Pixelflow CLI - Grayscale Dataflow Pipelines
//!
//! Builds a linear Source -> ops -> Sink graph from command-line options,
//! runs it and writes the sink's buffer as raw bytes.

use anyhow::{anyhow, bail, Context, Result};
use pixelflow::ops::dimensions::{divisor_pairs, infer_dimensions, Confidence};
use pixelflow::prelude::*;
use std::path::Path;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("pixelflow", String::as_str);

    let config = match option_value(&args, "--config") {
        Some(path) => FlowConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path))?,
        None => FlowConfig::default(),
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    println!("🎨 Pixelflow - Grayscale Dataflow Pipelines v{}", pixelflow::VERSION);
    println!();

    if args.len() < 2 {
        print_usage(program);
        return Ok(());
    }

    match args[1].as_str() {
        "list" => list_kinds(),
        "info" => {
            let kind = args.get(2).ok_or_else(|| anyhow!("Please specify a node kind"))?;
            kind_info(kind)?;
        }
        "dims" => {
            let count = args.get(2).ok_or_else(|| anyhow!("Please specify a sample count"))?;
            let count: usize = count
                .parse()
                .with_context(|| format!("Invalid sample count '{}'", count))?;
            show_dimensions(count);
        }
        "process" => {
            if args.len() < 4 {
                bail!(
                    "Please specify input and output paths\nUsage: {} process <input> <output> [options]",
                    program
                );
            }
            process(&args[2..], &config)?;
        }
        "help" | "--help" | "-h" => print_usage(program),
        other => {
            print_usage(program);
            bail!("Unknown command: {}", other);
        }
    }

    Ok(())
}

fn print_usage(program: &str) {
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                          List all node kinds");
    println!("  info <kind>                   Show ports and parameters of a kind");
    println!("  dims <count>                  Show the inferred shape for a sample count");
    println!("  process <in> <out> [options]  Run a linear pipeline, write raw output");
    println!("  help                          Show this help message");
    println!();
    println!("Process options:");
    println!("  --format <f>        auto, raw, text or image (default: auto)");
    println!("  --width <w> --height <h>  Declared shape for raw/text input");
    println!("  --op <op>           Append a step; repeatable:");
    println!("                        brightness:<delta>  threshold:<t>");
    println!("                        mean  laplacian  median:<size>  kernel:<file>");
    println!("  --histogram         Print a histogram of the result");
    println!("  --diff              Print metrics of the result against the input");
    println!("  --preview <png>     Also write the result as PNG");
    println!("  --config <toml>     Load defaults from a config file");
}

fn list_kinds() {
    println!("Available node kinds ({} total):", NodeKind::ALL.len());
    println!();
    for kind in NodeKind::ALL {
        let metadata = kind.metadata();
        println!("  • {:<12} [{}] {}", metadata.id, metadata.category.display_name(), metadata.description);
    }
}

fn kind_info(id: &str) -> Result<()> {
    let kind: NodeKind = id
        .parse()
        .map_err(|e| anyhow!("{}\nUse 'list' to see available kinds.", e))?;
    let metadata = kind.metadata();

    println!("Kind: {}", metadata.name);
    println!("ID: {}", metadata.id);
    println!("Category: {}", metadata.category.display_name());
    println!();
    println!("Description:");
    println!("  {}", metadata.description);
    println!();

    if !metadata.inputs.is_empty() {
        println!("Inputs: {}", metadata.inputs.join(", "));
    }
    if !metadata.outputs.is_empty() {
        println!("Outputs: {}", metadata.outputs.join(", "));
    }

    if !metadata.parameters.is_empty() {
        println!();
        println!("Parameters:");
        for param in &metadata.parameters {
            println!("  • {} [{}] = {}", param.name, param.param_type, param.default_value);
            if !param.description.is_empty() {
                println!("    {}", param.description);
            }
        }
    }

    Ok(())
}

fn show_dimensions(count: usize) {
    match infer_dimensions(count) {
        Some(inferred) => {
            let confidence = match inferred.confidence {
                Confidence::High => "high",
                Confidence::Low => "low",
            };
            println!("{} samples -> {} ({} confidence)", count, inferred.dimensions, confidence);
            let pairs: Vec<String> = divisor_pairs(count).iter().map(|d| d.to_string()).collect();
            println!("Candidates: {}", pairs.join(", "));
        }
        None => println!("{} samples cannot form an image", count),
    }
}

/// One `--op` step.
enum Step {
    Brightness(f64),
    Threshold(f64),
    Preset(ConvolutionPreset),
    Median(i64),
    Kernel(String),
}

impl Step {
    fn parse(op: &str) -> Result<Self> {
        let (name, arg) = match op.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (op, None),
        };
        let number = |what: &str| -> Result<f64> {
            let arg = arg.ok_or_else(|| anyhow!("'{}' needs a {}", name, what))?;
            arg.parse()
                .with_context(|| format!("Invalid {} '{}' for '{}'", what, arg, name))
        };

        let step = match name {
            "brightness" => Step::Brightness(number("delta")?),
            "threshold" => Step::Threshold(number("threshold")?),
            "mean" => Step::Preset(ConvolutionPreset::Mean3x3),
            "laplacian" => Step::Preset(ConvolutionPreset::Laplacian),
            "median" => Step::Median(number("window size")? as i64),
            "kernel" => {
                let path = arg.ok_or_else(|| anyhow!("'kernel' needs a file"))?;
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read kernel {}", path))?;
                Kernel::parse(&text).with_context(|| format!("Malformed kernel in {}", path))?;
                Step::Kernel(text)
            }
            other => bail!("Unknown op '{}'", other),
        };
        Ok(step)
    }

    fn add_to(self, graph: &mut FlowGraph) -> Result<NodeId> {
        let id = match self {
            Step::Brightness(delta) => graph.add_node(
                NodeKind::PointOp,
                &[("operation", Value::from("brightness")), ("delta", Value::from(delta))],
            )?,
            Step::Threshold(t) => graph.add_node(
                NodeKind::PointOp,
                &[("operation", Value::from("threshold")), ("t", Value::from(t))],
            )?,
            Step::Preset(preset) => graph.add_node(
                NodeKind::Convolution,
                &[("preset", Value::from(preset.as_str()))],
            )?,
            Step::Median(size) => graph.add_node(NodeKind::Median, &[("size", Value::from(size))])?,
            Step::Kernel(text) => graph.add_node(
                NodeKind::Convolution,
                &[("preset", Value::from("custom")), ("kernel", Value::from(text))],
            )?,
        };
        Ok(id)
    }
}

fn process(args: &[String], config: &FlowConfig) -> Result<()> {
    let input_path = &args[0];
    let output_path = &args[1];

    let mut import = config.to_import_options();
    let mut width: Option<usize> = import.dimensions.map(|d| d.width);
    let mut height: Option<usize> = import.dimensions.map(|d| d.height);
    let mut steps = Vec::new();
    let mut histogram = false;
    let mut diff = false;
    let mut preview: Option<&str> = None;

    let mut i = 2;
    while i < args.len() {
        let value = args.get(i + 1).map(String::as_str);
        match (args[i].as_str(), value) {
            ("--format", Some(v)) => {
                import.format = v.parse().map_err(|e: String| anyhow!(e))?;
                i += 2;
            }
            ("--width", Some(v)) => {
                width = Some(v.parse().with_context(|| format!("Invalid width '{}'", v))?);
                i += 2;
            }
            ("--height", Some(v)) => {
                height = Some(v.parse().with_context(|| format!("Invalid height '{}'", v))?);
                i += 2;
            }
            ("--op", Some(v)) => {
                steps.push(Step::parse(v)?);
                i += 2;
            }
            ("--preview", Some(v)) => {
                preview = Some(v);
                i += 2;
            }
            ("--config", Some(_)) => i += 2,
            ("--histogram", _) => {
                histogram = true;
                i += 1;
            }
            ("--diff", _) => {
                diff = true;
                i += 1;
            }
            (other, _) => bail!("Unknown or incomplete option: {}", other),
        }
    }

    import.dimensions = match (width, height) {
        (Some(w), Some(h)) => Some(Dimensions::new(w, h)),
        (None, None) => None,
        _ => bail!("--width and --height must be given together"),
    };

    // Build the pipeline
    let mut graph = FlowGraph::new();
    let source = graph.add_node(NodeKind::Source, &[])?;
    let mut prev = source;
    for step in steps {
        let node = step.add_to(&mut graph)?;
        graph.connect(prev, IMAGE_PORT, node, IMAGE_PORT)?;
        prev = node;
    }
    let sink = graph.add_node(NodeKind::Sink, &[])?;
    graph.connect(prev, IMAGE_PORT, sink, IMAGE_PORT)?;

    let histogram_node = if histogram {
        let node = graph.add_node(NodeKind::Histogram, &[])?;
        graph.connect(prev, IMAGE_PORT, node, IMAGE_PORT)?;
        Some(node)
    } else {
        None
    };
    let diff_node = if diff {
        let node = graph.add_node(NodeKind::Difference, &[])?;
        graph.connect(source, IMAGE_PORT, node, DIFF_A_PORT)?;
        graph.connect(prev, IMAGE_PORT, node, DIFF_B_PORT)?;
        Some(node)
    } else {
        None
    };

    let imported = graph
        .load_source_file(source, input_path, &import)
        .with_context(|| format!("Failed to load {}", input_path))?;
    println!("📥 Loaded {} as {}", imported.buffer, imported.format);
    if imported.is_low_confidence() {
        println!("⚠️  Shape is a guess; pass --width and --height to override");
    }

    // Validate
    let report = ValidationPipeline::default().validate(&graph);
    for warning in &report.warnings {
        println!("⚠️  {}", warning.message);
    }
    if !report.errors.is_empty() {
        eprintln!("❌ Validation failed:");
        for line in report.detailed_errors() {
            eprintln!("   {}", line);
        }
        bail!("{}", report.summary());
    }

    // Execute
    println!("⚙️  Processing {} -> {}", input_path, output_path);
    let options = config.to_execution_options().with_progress(|update| match update {
        ProgressUpdate::NodeStarted { node_name, .. } => {
            println!("   • Running: {}", node_name);
        }
        ProgressUpdate::NodeFailed { message, .. } => {
            eprintln!("   ❌ {}", message);
        }
        ProgressUpdate::Completed {
            total_duration_ms,
            nodes_processed,
            ..
        } => {
            println!("✅ Complete in {}ms ({} nodes)", total_duration_ms, nodes_processed);
        }
        ProgressUpdate::Aborted { message } => {
            eprintln!("❌ Aborted: {}", message);
        }
        _ => {}
    });
    let run = ExecutionEngine::new().run_with(&mut graph, &options)?;

    for message in &run.messages {
        let node = graph.node(message.node_id)?.display_name();
        println!("   [{:?}] {}: {}", message.level, node, message.message);
    }

    if let Some(node) = histogram_node {
        if let Some(hist) = graph.histogram(node)? {
            print_histogram(hist);
        }
    }
    if let Some(node) = diff_node {
        if let Some(metrics) = graph.metrics(node)? {
            println!("📏 {}", metrics);
        }
    }

    graph
        .export_persisted(sink, output_path)
        .with_context(|| format!("Failed to write {}", output_path))?;
    println!("🎉 Result saved to: {}", output_path);

    if let Some(path) = preview {
        if let Some(buffer) = graph.persisted(sink)? {
            pixelflow::io::decode::save_png(Path::new(path), buffer)?;
            println!("🖼️  Preview saved to: {}", path);
        }
    }

    Ok(())
}

fn print_histogram(hist: &Histogram) {
    const BUCKETS: usize = 16;
    const BAR: u64 = 40;

    println!(
        "📊 Histogram: {} samples, mean {:.2}, mode {}",
        hist.total(),
        hist.mean(),
        hist.mode()
    );
    let buckets: Vec<u64> = hist
        .counts()
        .chunks(hist.counts().len() / BUCKETS)
        .map(|chunk| chunk.iter().sum())
        .collect();
    let peak = buckets.iter().copied().max().unwrap_or(0).max(1);
    let width = hist.counts().len() / BUCKETS;
    for (i, count) in buckets.iter().enumerate() {
        let bar = "#".repeat((count * BAR / peak) as usize);
        println!("   {:>3}-{:>3} {:>8} {}", i * width, (i + 1) * width - 1, count, bar);
    }
}

/// Value following `flag`, if present.
fn option_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
