// ============================================================
// Layer 4: Synthetic Click Log
// ============================================================
// Generates a reproducible movie-recommendation click log with
// a planted click model, so a trained network has real signal
// to recover.
//
// Every sample carries four columns:
//
//   userId       [u]            1..=num_users
//   movieId      [m]            1..=num_movies
//   genre        [g]            1..=num_genres (fixed per movie)
//   history      [h1, .., hk]   recently watched movies, k ≥ 1
//   history_len  [k]
//
// Id 0 is never emitted; the batcher uses it as padding.
//
// Click model (latent factors drawn once from the seed):
//
//   s = ⟨u, m⟩ + genre_bias[g] + ½ · mean_h ⟨h, m⟩
//   P(click) = σ(2s)

use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::{
    field::FieldSpec,
    sample::CtrSample,
    traits::SampleSource,
};

pub const USER_FIELD:        &str = "userId";
pub const MOVIE_FIELD:       &str = "movieId";
pub const GENRE_FIELD:       &str = "genre";
pub const HISTORY_FIELD:     &str = "history";
pub const HISTORY_LEN_FIELD: &str = "history_len";

#[derive(Debug, Clone)]
pub struct SyntheticClickLog {
    pub num_samples: usize,
    pub num_users:   usize,
    pub num_movies:  usize,
    pub num_genres:  usize,
    /// Longest watch history per sample
    pub max_history: usize,
    pub latent_dim:  usize,
    pub seed:        u64,
}

impl Default for SyntheticClickLog {
    fn default() -> Self {
        Self {
            num_samples: 2_000,
            num_users:   50,
            num_movies:  100,
            num_genres:  8,
            max_history: 5,
            latent_dim:  4,
            seed:        42,
        }
    }
}

impl SyntheticClickLog {
    pub fn new(num_samples: usize, seed: u64) -> Self {
        Self { num_samples, seed, ..Self::default() }
    }

    fn genre_of(&self, movie: usize) -> usize {
        movie % self.num_genres
    }

    fn factors(&self, rng: &mut StdRng, rows: usize) -> Vec<Vec<f32>> {
        let scale = 1.0 / (self.latent_dim as f32).sqrt();
        (0..rows)
            .map(|_| (0..self.latent_dim).map(|_| rng.gen_range(-1.0..1.0) * scale).collect())
            .collect()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl SampleSource for SyntheticClickLog {
    fn field_specs(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::categorical(USER_FIELD,  self.num_users + 1),
            FieldSpec::categorical(MOVIE_FIELD, self.num_movies + 1),
            FieldSpec::categorical(GENRE_FIELD, self.num_genres + 1),
            FieldSpec::sequence(HISTORY_FIELD, self.num_movies + 1, self.max_history, HISTORY_LEN_FIELD),
        ]
    }

    fn load_all(&self) -> Result<Vec<CtrSample>> {
        if self.num_users == 0 || self.num_movies == 0 || self.num_genres == 0 {
            bail!("Synthetic click log needs at least one user, movie and genre");
        }
        if self.max_history == 0 || self.latent_dim == 0 {
            bail!("max_history and latent_dim must be positive");
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let users   = self.factors(&mut rng, self.num_users);
        let movies  = self.factors(&mut rng, self.num_movies);
        let genre_bias: Vec<f32> = (0..self.num_genres).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let mut samples = Vec::with_capacity(self.num_samples);
        let mut clicks  = 0usize;

        for _ in 0..self.num_samples {
            let user    = rng.gen_range(0..self.num_users);
            let movie   = rng.gen_range(0..self.num_movies);
            let genre   = self.genre_of(movie);
            let len     = rng.gen_range(1..=self.max_history);
            let history: Vec<usize> = (0..len).map(|_| rng.gen_range(0..self.num_movies)).collect();

            let affinity = history.iter().map(|&h| dot(&movies[h], &movies[movie])).sum::<f32>() / len as f32;
            let score    = dot(&users[user], &movies[movie]) + genre_bias[genre] + 0.5 * affinity;
            let p_click  = 1.0 / (1.0 + (-2.0 * score).exp());
            let label    = if rng.gen::<f32>() < p_click { 1.0 } else { 0.0 };
            clicks += label as usize;

            samples.push(
                CtrSample::new(label)
                    .with_field(USER_FIELD,        vec![user as i64 + 1])
                    .with_field(MOVIE_FIELD,       vec![movie as i64 + 1])
                    .with_field(GENRE_FIELD,       vec![genre as i64 + 1])
                    .with_field(HISTORY_FIELD,     history.iter().map(|&h| h as i64 + 1).collect())
                    .with_field(HISTORY_LEN_FIELD, vec![len as i64]),
            );
        }

        tracing::info!(
            "Generated {} synthetic impressions ({} clicks, seed={})",
            samples.len(), clicks, self.seed,
        );
        Ok(samples)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_log() {
        let a = SyntheticClickLog::new(50, 7).load_all().unwrap();
        let b = SyntheticClickLog::new(50, 7).load_all().unwrap();
        let c = SyntheticClickLog::new(50, 8).load_all().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ids_fit_their_fields() {
        let log   = SyntheticClickLog::new(200, 1);
        let specs = log.field_specs();
        for sample in log.load_all().unwrap() {
            for spec in &specs {
                let ids = sample.field(&spec.name).unwrap();
                assert!(ids.iter().all(|&id| id >= 1 && (id as usize) < spec.cardinality));
            }
            let len = sample.field(HISTORY_LEN_FIELD).unwrap()[0] as usize;
            assert_eq!(sample.field(HISTORY_FIELD).unwrap().len(), len);
            assert!(len >= 1 && len <= log.max_history);
        }
    }

    #[test]
    fn test_both_labels_occur() {
        let samples = SyntheticClickLog::new(500, 3).load_all().unwrap();
        let clicks  = samples.iter().filter(|s| s.is_click()).count();
        assert!(clicks > 0 && clicks < samples.len());
    }

    #[test]
    fn test_genre_is_fixed_per_movie() {
        let samples = SyntheticClickLog::new(300, 5).load_all().unwrap();
        let mut seen = std::collections::HashMap::new();
        for s in &samples {
            let movie = s.field(MOVIE_FIELD).unwrap()[0];
            let genre = s.field(GENRE_FIELD).unwrap()[0];
            assert_eq!(*seen.entry(movie).or_insert(genre), genre);
        }
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let log = SyntheticClickLog { num_genres: 0, ..SyntheticClickLog::default() };
        assert!(log.load_all().is_err());
    }
}
