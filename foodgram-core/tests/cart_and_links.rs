//! End-to-end behaviour of the shopping list and short-code helpers against
//! small in-memory stand-ins for the database tables.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use foodgram_core::{
    claim_unique_short_code, is_valid_short_code, render_shopping_list, Claim, IngredientAmount,
    MAX_SHORT_CODE_ATTEMPTS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// recipe id -> ingredient rows
type Recipes = BTreeMap<i64, Vec<IngredientAmount>>;

fn cart_rows(recipes: &Recipes, cart: &[i64]) -> Vec<IngredientAmount> {
    cart.iter()
        .filter_map(|id| recipes.get(id))
        .flatten()
        .cloned()
        .collect()
}

fn sample_recipes() -> Recipes {
    let mut recipes = Recipes::new();
    recipes.insert(
        1,
        vec![
            IngredientAmount::new("Sugar", "g", 100),
            IngredientAmount::new("Milk", "ml", 250),
            IngredientAmount::new("Salt", "g", 5),
        ],
    );
    recipes.insert(
        2,
        vec![
            IngredientAmount::new("Sugar", "g", 50),
            IngredientAmount::new("Flour", "g", 300),
            IngredientAmount::new("Eggs", "pcs", 2),
            IngredientAmount::new("Salt", "tsp", 2),
        ],
    );
    recipes.insert(3, Vec::new());
    recipes
}

#[test]
fn test_cart_with_two_recipes() {
    let recipes = sample_recipes();
    let text = render_shopping_list(cart_rows(&recipes, &[2, 1]));

    assert_eq!(
        text,
        [
            "Eggs (pcs) — 2",
            "Flour (g) — 300",
            "Milk (ml) — 250",
            "Salt (g) — 5",
            "Salt (tsp) — 2",
            "Sugar (g) — 150",
        ]
        .join("\n")
    );
    assert_eq!(text.lines().filter(|l| l.starts_with("Sugar")).count(), 1);
}

#[test]
fn test_empty_cart_and_ingredientless_recipe() {
    let recipes = sample_recipes();
    assert_eq!(render_shopping_list(cart_rows(&recipes, &[])), "");
    assert_eq!(render_shopping_list(cart_rows(&recipes, &[3])), "");
}

#[test]
fn test_download_twice_is_byte_identical() {
    let recipes = sample_recipes();
    let first = render_shopping_list(cart_rows(&recipes, &[1, 2]));
    let second = render_shopping_list(cart_rows(&recipes, &[1, 2]));
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_every_recipe_gets_a_distinct_code() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut table: HashMap<String, i64> = HashMap::new();

    for recipe_id in 0..2_000 {
        let (code, id) = claim_unique_short_code(&mut rng, MAX_SHORT_CODE_ATTEMPTS, |code| {
            if table.contains_key(code) {
                return Ok::<_, ()>(Claim::Taken);
            }
            table.insert(code.to_string(), recipe_id);
            Ok(Claim::Claimed(recipe_id))
        })
        .unwrap();
        assert_eq!(id, recipe_id);
        assert!(is_valid_short_code(&code));
    }

    assert_eq!(table.len(), 2_000);
}

/// Two writers that pick the same candidate: the unique "constraint" lets
/// exactly one win and the loser retries with a fresh code.
#[test]
fn test_racing_writers_end_up_with_different_codes() {
    let taken: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let taken = Arc::clone(&taken);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                // Same seed: both threads draw the same first candidate.
                let mut rng = StdRng::seed_from_u64(11);
                barrier.wait();
                let (code, _) = claim_unique_short_code(&mut rng, MAX_SHORT_CODE_ATTEMPTS, |code| {
                    let inserted = taken.lock().unwrap().insert(code.to_string());
                    Ok::<_, ()>(if inserted { Claim::Claimed(()) } else { Claim::Taken })
                })
                .unwrap();
                code
            })
        })
        .collect();

    let codes: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_ne!(codes[0], codes[1]);
    assert_eq!(taken.lock().unwrap().len(), 2);
}
