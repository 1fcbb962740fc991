use tracing::info;

use summit_catalog::{Difficulty, Mountain, Route};
use summit_core::repository::CatalogRepository;
use summit_core::{RepoError, RepoResult};

const RINJANI_SLUG: &str = "gunung-rinjani";
const SENARU_SLUG: &str = "jalur-senaru";

const SENARU_FACILITIES: &str = "Pemandu lokal bersertifikat TNGL
Porter untuk membawa logistik grup
Tenda camping 4 season
Sleeping bag & matras
Makanan 3x sehari (sarapan, makan siang, makan malam)
Snack & air mineral
Perlengkapan masak lengkap
Izin masuk TNGL (Taman Nasional Gunung Rinjani)
P3K & oksigen portable
Sertifikat pendakian
Dokumentasi foto";

const SENARU_REQUIREMENTS: &str = "Minimal umur 17 tahun
Kondisi fisik sehat dan bugar
Surat keterangan sehat dari dokter (untuk umur 50+)
KTP/Paspor asli dan fotokopi
Asuransi perjalanan (sangat disarankan)
Perlengkapan pribadi:
- Carrier/tas gunung 40-60L
- Jaket tebal/windproof
- Sepatu tracking/hiking
- Sleeping bag (jika punya)
- Headlamp/senter
- Pakaian ganti 2-3 set
- Kaus kaki tebal
- Sarung tangan
- Peralatan mandi secukupnya";

#[derive(Debug)]
pub struct SeedReport {
    pub mountain: Mountain,
    pub mountain_created: bool,
    pub route: Route,
    pub route_created: bool,
}

fn rinjani() -> Mountain {
    let mut mountain = Mountain::new(
        "Gunung Rinjani",
        "Gunung Rinjani adalah gunung berapi tertinggi kedua di Indonesia dengan ketinggian \
         3.726 mdpl. Terletak di Pulau Lombok, Nusa Tenggara Barat.",
        3726,
        "Lombok Utara",
        "Nusa Tenggara Barat",
        Difficulty::Hard,
    );
    mountain.slug = RINJANI_SLUG.to_string();
    mountain
}

fn senaru(mountain: &Mountain) -> Route {
    let mut route = Route::new(
        mountain.id,
        "Jalur Senaru",
        "Jalur Senaru adalah rute paling populer untuk mendaki Gunung Rinjani dengan pemandangan \
         Danau Segara Anak yang memukau. Jalur ini dimulai dari Desa Senaru, Lombok Utara.",
        "Desa Senaru, Lombok Utara",
        3,
        2,
        22.5,
        1_800_000,
    );
    route.slug = SENARU_SLUG.to_string();
    route.facilities = SENARU_FACILITIES.to_string();
    route.requirements = SENARU_REQUIREMENTS.to_string();
    route
}

/// Inserts Gunung Rinjani and the Senaru route unless they already exist.
/// Safe to run any number of times.
pub async fn setup_rinjani(catalog: &dyn CatalogRepository) -> RepoResult<SeedReport> {
    let (mountain, mountain_created) = match catalog.get_mountain_by_slug(RINJANI_SLUG).await? {
        Some(existing) => (existing, false),
        None => {
            let mountain = rinjani();
            match catalog.create_mountain(&mountain).await {
                Ok(()) => (mountain, true),
                // Lost a race with another seeder, or the mountain is inactive.
                Err(RepoError::Conflict(_)) => (
                    catalog
                        .get_mountain_by_slug(RINJANI_SLUG)
                        .await?
                        .ok_or(RepoError::NotFound)?,
                    false,
                ),
                Err(e) => return Err(e),
            }
        }
    };
    info!(mountain = %mountain.name, created = mountain_created, "seeded mountain");

    let (route, route_created) = match catalog.get_route_by_slug(mountain.id, SENARU_SLUG).await? {
        Some(existing) => (existing, false),
        None => {
            let route = senaru(&mountain);
            match catalog.create_route(&route).await {
                Ok(()) => (route, true),
                Err(RepoError::Conflict(_)) => (
                    catalog
                        .get_route_by_slug(mountain.id, SENARU_SLUG)
                        .await?
                        .ok_or(RepoError::NotFound)?,
                    false,
                ),
                Err(e) => return Err(e),
            }
        }
    };
    info!(route = %route.name, created = route_created, "seeded route");

    Ok(SeedReport {
        mountain,
        mountain_created,
        route,
        route_created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_setup_is_idempotent() {
        let store = MemoryStore::new();

        let first = setup_rinjani(&store).await.unwrap();
        assert!(first.mountain_created);
        assert!(first.route_created);
        assert_eq!(first.route.price_per_person, 1_800_000);
        assert_eq!(first.route.facilities_list().len(), 11);

        let second = setup_rinjani(&store).await.unwrap();
        assert!(!second.mountain_created);
        assert!(!second.route_created);
        assert_eq!(second.route.id, first.route.id);
        assert_eq!(store.list_mountains().await.unwrap().len(), 1);
    }
}
