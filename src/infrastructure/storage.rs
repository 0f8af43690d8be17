use crate::config::UnzipperConfig;
use crate::services::storage::S3StorageService;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &UnzipperConfig) -> Arc<S3StorageService> {
    // Credentials and region come from the default provider chain
    let mut loader = aws_config::from_env();
    if let Some(endpoint_url) = &config.s3_endpoint {
        info!("☁️  S3 Storage: custom endpoint {}", endpoint_url);
        loader = loader.endpoint_url(endpoint_url);
    } else {
        info!("☁️  S3 Storage: default AWS endpoint");
    }
    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.s3_force_path_style)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    info!(
        "🪣 Destination bucket '{}' (path style: {})",
        config.destination_bucket, config.s3_force_path_style
    );

    Arc::new(S3StorageService::new(s3_client))
}
