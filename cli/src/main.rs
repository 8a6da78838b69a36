//! Sparqler CLI — render, execute and parse SPARQL queries from the shell
//!
//! Uses the sparqler `Endpoint` to talk to a SPARQL endpoint over HTTP.

use clap::{Args, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use serde_json::Value;
use sparqler::{
    Endpoint, EndpointConfig, JsonParser, PrefixMap, Query, QueryResults, ResolvedSolution,
};
use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "sparqler", version, about = "SPARQL query templating and execution")]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Args)]
struct TemplateArgs {
    /// Query template, or @path to read it from a file
    template: String,

    /// Raw substitution, name=value
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// IRI substitution, name=iri
    #[arg(long = "uri", value_parser = parse_key_value)]
    uris: Vec<(String, String)>,

    /// Literal substitution, name=value (value read as JSON when it parses)
    #[arg(long = "literal", value_parser = parse_key_value)]
    literals: Vec<(String, String)>,

    /// Prefix declaration, name=iri
    #[arg(long = "prefix", value_parser = parse_key_value)]
    prefixes: Vec<(String, String)>,

    /// Declare the well-known prefixes the query refers to
    #[arg(long)]
    common_prefixes: bool,
}

#[derive(Args)]
struct EndpointArgs {
    /// SPARQL endpoint URL
    #[arg(long, env = "SPARQLER_ENDPOINT")]
    endpoint: Option<String>,

    /// Endpoint configuration file (YAML, or JSON with a .json extension)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named graph
    #[arg(long)]
    graph: Option<String>,

    /// Timeout passed to the endpoint, in milliseconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rendered query
    Render {
        #[command(flatten)]
        template: TemplateArgs,
    },
    /// Execute a query and print the normalized results
    Query {
        #[command(flatten)]
        template: TemplateArgs,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },
    /// Normalize a SPARQL/JSON response file (`-` for stdin)
    Parse {
        file: String,
    },
    /// Start an interactive shell
    Shell {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render { template } => run_render(&template),
        Commands::Query { template, endpoint } => run_query(&template, &endpoint, &cli.format).await,
        Commands::Parse { file } => run_parse(&file, &cli.format),
        Commands::Shell { endpoint } => run_shell(&endpoint, &cli.format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{}`", s))
}

fn read_template(template: &str) -> CliResult<String> {
    match template.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(template.to_string()),
    }
}

/// Substituted query (without prefixes) and the prefixes to declare
fn build_query(args: &TemplateArgs) -> CliResult<(Query, PrefixMap)> {
    let template = read_template(&args.template)?;

    let literals: Vec<(&str, Value)> = args
        .literals
        .iter()
        .map(|(name, raw)| {
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
            (name.as_str(), value)
        })
        .collect();

    let query = Query::new(template)
        .set_parameters(args.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .set_uris(args.uris.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .set_json_literals(literals.iter().map(|(k, v)| (*k, v)))?;

    let explicit: PrefixMap = args.prefixes.iter().cloned().collect();
    let prefixes = if args.common_prefixes {
        PrefixMap::common()
            .used_in(query.query_string())
            .merge(&explicit)
    } else {
        explicit
    };

    debug!("Built query with {} prefix(es)", prefixes.len());
    Ok((query, prefixes))
}

fn build_endpoint(args: &EndpointArgs, prefixes: &PrefixMap) -> CliResult<Endpoint> {
    let mut config = match &args.config {
        Some(path) => EndpointConfig::load(path)?,
        None => EndpointConfig::default(),
    };
    if let Some(url) = &args.endpoint {
        config.url = url.clone();
    }
    if let Some(graph) = &args.graph {
        config.graph = graph.clone();
    }
    if let Some(timeout) = args.timeout {
        config.execution = config.execution.with_timeout(timeout);
    }

    Ok(Endpoint::new(config)?.add_prefixes(prefixes))
}

fn run_render(args: &TemplateArgs) -> CliResult<()> {
    let (query, prefixes) = build_query(args)?;
    println!("{}", query.add_prefixes(&prefixes));
    Ok(())
}

async fn run_query(
    template: &TemplateArgs,
    endpoint_args: &EndpointArgs,
    format: &OutputFormat,
) -> CliResult<()> {
    let (query, prefixes) = build_query(template)?;
    let endpoint = build_endpoint(endpoint_args, &prefixes)?;

    let results = endpoint.execute(query).await?;
    print_results(&results, endpoint.prefixes(), format)
}

fn run_parse(file: &str, format: &OutputFormat) -> CliResult<()> {
    let body = if file == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        body
    } else {
        std::fs::read_to_string(file)?
    };

    let results = JsonParser::new(&body)?.parse()?;
    print_results(&results, &PrefixMap::common(), format)
}

async fn run_shell(endpoint_args: &EndpointArgs, format: &OutputFormat) -> CliResult<()> {
    let endpoint = build_endpoint(endpoint_args, &PrefixMap::new())?;
    println!("Sparqler Interactive Shell ({})", endpoint.url());
    println!("Type SPARQL queries, or :help for commands. :quit to exit.\n");

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        eprint!("sparql> ");

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed {
            ":quit" | ":exit" | ":q" => break,
            ":help" | ":h" => {
                println!("Commands:");
                println!("  :prefixes — Show configured and auto-declared prefixes");
                println!("  :quit     — Exit shell");
                println!("  <sparql>  — Execute a SPARQL query");
            }
            ":prefixes" => {
                println!("Always declared:");
                for (prefix, iri) in endpoint.prefixes().iter() {
                    println!("  {}: <{}>", prefix, iri);
                }
                println!("Declared when the query uses them:");
                for (prefix, iri) in auto_prefixes(endpoint.prefixes(), None).iter() {
                    println!("  {}: <{}>", prefix, iri);
                }
            }
            sparql => {
                let auto = auto_prefixes(endpoint.prefixes(), Some(sparql));
                let query = Query::new(sparql).add_prefixes(&auto);
                let display = endpoint.prefixes().merge(&auto);
                match endpoint.execute(query).await {
                    Ok(results) => {
                        if let Err(e) = print_results(&results, &display, format) {
                            eprintln!("Error: {}", e);
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
    }

    println!("Bye!");
    Ok(())
}

/// Common prefixes the endpoint does not already declare, narrowed to the
/// ones `query` refers to when given
fn auto_prefixes(configured: &PrefixMap, query: Option<&str>) -> PrefixMap {
    let common = match query {
        Some(query) => PrefixMap::common().used_in(query),
        None => PrefixMap::common(),
    };
    common
        .iter()
        .filter(|(prefix, _)| configured.get_iri(prefix).is_err())
        .collect()
}

fn print_results(
    results: &QueryResults,
    prefixes: &PrefixMap,
    format: &OutputFormat,
) -> CliResult<()> {
    match (results, format) {
        (_, OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
        (QueryResults::Ask(ask), _) => {
            println!("{}", ask.results);
        }
        (QueryResults::Select(select), OutputFormat::Csv) => {
            let columns = select.columns();
            println!("{}", columns.join(","));
            for row in &select.results {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| format_csv_value(&format_solution(row.get(c), prefixes)))
                    .collect();
                println!("{}", cells.join(","));
            }
        }
        (QueryResults::Select(select), OutputFormat::Table) => {
            let columns = select.columns();
            if columns.is_empty() {
                println!("(no results)");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(&columns);

            for row in &select.results {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| format_solution(row.get(c), prefixes))
                    .collect();
                table.add_row(cells);
            }

            println!("{}", table);
            println!("{} row(s)", select.len());
        }
    }

    Ok(())
}

fn format_solution(solution: Option<&ResolvedSolution>, prefixes: &PrefixMap) -> String {
    match solution {
        None => String::new(),
        Some(s) if s.is_uri() => {
            let iri = s.value.to_string();
            prefixes
                .compact(&iri)
                .unwrap_or_else(|| format!("<{}>", iri))
        }
        Some(s) if s.language != sparqler::sparql::UNKNOWN => {
            format!("\"{}\"@{}", s.value, s.language)
        }
        Some(s) => s.value.to_string(),
    }
}

fn format_csv_value(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparqler::SolutionValue;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("s=http://a=b"),
            Ok(("s".to_string(), "http://a=b".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn test_format_solution() {
        let prefixes = PrefixMap::common();
        let uri = ResolvedSolution::new("http://xmlns.com/foaf/0.1/Person", "unknown", "uri");
        assert_eq!(format_solution(Some(&uri), &prefixes), "foaf:Person");

        let other = ResolvedSolution::new("http://example.org/x", "unknown", "uri");
        assert_eq!(format_solution(Some(&other), &prefixes), "<http://example.org/x>");

        let tagged = ResolvedSolution::new("Bob", "en", "unknown");
        assert_eq!(format_solution(Some(&tagged), &prefixes), "\"Bob\"@en");

        let number = ResolvedSolution::new(SolutionValue::Integer(7), "unknown", "x");
        assert_eq!(format_solution(Some(&number), &prefixes), "7");
        assert_eq!(format_solution(None, &prefixes), "");
    }

    #[test]
    fn test_auto_prefixes_skip_configured() {
        let configured = PrefixMap::new().with_prefix("foaf", "http://example.org/my-foaf/");

        let auto = auto_prefixes(&configured, Some("SELECT * WHERE { ?s foaf:name ?n ; rdfs:label ?l }"));
        let names: Vec<_> = auto.iter().map(|(p, _)| p).collect();
        assert_eq!(names, vec!["rdfs"]);

        let listed = auto_prefixes(&configured, None);
        assert_eq!(listed.len(), PrefixMap::common().len() - 1);
        assert!(listed.get_iri("foaf").is_err());
        assert!(listed.get_iri("rdf").is_ok());
    }

    #[test]
    fn test_format_csv_value() {
        assert_eq!(format_csv_value("plain"), "plain");
        assert_eq!(format_csv_value("a,b"), "\"a,b\"");
        assert_eq!(format_csv_value("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_build_query() {
        let args = TemplateArgs {
            template: "SELECT * WHERE { ?s foaf:name ?name ; foaf:age ?age }".to_string(),
            params: vec![],
            uris: vec![("s".to_string(), "http://example.org/alice".to_string())],
            literals: vec![
                ("name".to_string(), "Alice".to_string()),
                ("age".to_string(), "30".to_string()),
            ],
            prefixes: vec![],
            common_prefixes: true,
        };

        let (query, prefixes) = build_query(&args).unwrap();
        assert_eq!(
            query.query_string(),
            "SELECT * WHERE { <http://example.org/alice> foaf:name 'Alice' ; foaf:age 30 }"
        );
        let names: Vec<_> = prefixes.iter().map(|(p, _)| p).collect();
        assert_eq!(names, vec!["foaf"]);
    }

    #[test]
    fn test_build_query_rejects_null_literal() {
        let args = TemplateArgs {
            template: "?x".to_string(),
            params: vec![],
            uris: vec![],
            literals: vec![("x".to_string(), "null".to_string())],
            prefixes: vec![],
            common_prefixes: false,
        };
        assert!(build_query(&args).is_err());
    }
}
