use clap::{Arg, Command, ValueHint};
use std::path::PathBuf;

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to a JSON configuration file. Defaults are used when omitted.")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn host_arg() -> Arg {
    Arg::new("host")
        .long("host")
        .help("Address to bind. Overrides the configuration file.")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::Hostname)
}

fn port_arg() -> Arg {
    Arg::new("port")
        .short('p')
        .long("port")
        .help("Port to bind. Overrides the configuration file.")
        .value_parser(clap::value_parser!(u16))
}

fn manifest_arg(help: &'static str) -> Arg {
    Arg::new("manifest")
        .short('m')
        .long("manifest")
        .help(help)
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::FilePath)
}

pub fn build_cli() -> Command {
    Command::new("homeval")
        .version(clap::crate_version!())
        .about("\u{1F3E0} homeval - house-price regression: train, serve and predict")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Rank features, write the feature manifest and fit the final model")
                .arg(config_arg())
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the training CSV. Overrides the training data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(manifest_arg(
                    "File the feature manifest is written to. Overrides the configuration file.",
                ))
                .arg(
                    Arg::new("model_type")
                        .long("model-type")
                        .help("Final model type. Overrides the model in the configuration file.")
                        .value_parser(["random_forest", "gbdt"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("tracking_root")
                        .long("tracking-root")
                        .help("Root directory of the experiment tracking store.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("experiment")
                        .long("experiment")
                        .help("Experiment name runs are grouped under.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("top_k")
                        .short('k')
                        .long("top-k")
                        .help("Number of features kept in the manifest.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("test_size")
                        .long("test-size")
                        .help("Fraction of rows held out for evaluation.")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the train/test shuffle.")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve predictions from the newest model over HTTP")
                .arg(config_arg())
                .arg(host_arg())
                .arg(port_arg())
                .arg(manifest_arg(
                    "Feature manifest to load instead of probing the default locations.",
                ))
                .arg(
                    Arg::new("artifact_root")
                        .short('r')
                        .long("artifact-root")
                        .help("Directory searched for model artifacts. May be repeated.")
                        .action(clap::ArgAction::Append)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::DirPath),
                ),
        )
        .subcommand(
            Command::new("ui")
                .about("Serve the browser form that calls the prediction API")
                .arg(config_arg())
                .arg(host_arg())
                .arg(port_arg())
                .arg(manifest_arg(
                    "Feature manifest to load instead of probing the default locations.",
                ))
                .arg(
                    Arg::new("api_url")
                        .long("api-url")
                        .help("Base URL of the prediction API.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Url),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}
