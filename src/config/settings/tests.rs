use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");
    assert_eq!(config.ollama.generation_model, "llama3.2:latest");
    assert_eq!(config.ollama.batch_size, 16);
    assert_eq!(config.ollama.embedding_dimension, 768);
    assert_eq!(config.chunking, ChunkingConfig::default());
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.generation_model = "  ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.ollama.batch_size = 1001;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn chunking_validation() {
    let mut config = Config::default();

    config.chunking.overlap = config.chunking.chunk_size;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::OverlapTooLarge(800, 800))
    ));

    config.chunking = ChunkingConfig {
        chunk_size: 50,
        overlap: 0,
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(50))
    ));

    config.chunking = ChunkingConfig {
        chunk_size: 1200,
        overlap: 200,
    };
    assert!(config.validate().is_ok());
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn data_paths_live_under_base_dir() {
    let config = Config {
        base_dir: PathBuf::from("/srv/rag"),
        ..Config::default()
    };

    assert_eq!(config.config_file_path(), Path::new("/srv/rag/config.toml"));
    assert_eq!(
        config.documents_path(),
        Path::new("/srv/rag/data/documents.jsonl")
    );
    assert_eq!(config.index_path(), Path::new("/srv/rag/data/vectors.arrow"));
    assert_eq!(
        config.index_metadata_path(),
        Path::new("/srv/rag/data/metadata.jsonl")
    );
}

#[test]
fn load_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().join("nested"),
        ..Config::default()
    };
    config.ollama.host = "gpu-box".to_string();
    config.chunking.chunk_size = 1000;

    config.save().expect("should save config");
    let loaded = Config::load(temp_dir.path().join("nested")).expect("should load config");

    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[ollama]\nbatch_size = 0\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert_eq!(config.protocol, "https");

    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_host(String::new()).is_err());
    assert_eq!(config.host, "example.com");

    assert!(config.set_generation_model("mistral:latest".to_string()).is_ok());
    assert!(config.set_generation_model(" ".to_string()).is_err());

    assert!(config.set_embedding_dimension(1024).is_ok());
    assert!(config.set_embedding_dimension(8).is_err());
    assert_eq!(config.embedding_dimension, 1024);
}
