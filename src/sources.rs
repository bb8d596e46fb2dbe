use anyhow::Result;

use crate::config::Config;
use crate::store::{open_store, VectorStore};

pub async fn run_list(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    print_filenames(store.as_ref()).await
}

async fn print_filenames(store: &dyn VectorStore) -> Result<()> {
    let names = store.list_filenames().await?;
    if names.is_empty() {
        println!("No documents uploaded yet.");
        return Ok(());
    }

    println!("Uploaded documents:");
    for name in names {
        println!("  - {}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = InMemoryStore::new(2);
        assert!(print_filenames(&store).await.is_ok());
        assert!(store.list_filenames().await.unwrap().is_empty());
    }
}
