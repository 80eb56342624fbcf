//! Randomized quiz building: answer options for one step and the final-quiz sample.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::LessonStep;

/// Number of questions in the final quiz (also the score denominator).
pub const FINAL_QUIZ_QUESTIONS: usize = 5;

/// Wrong options shown next to the correct title.
pub const DISTRACTORS: usize = 3;

/// Correct title plus up to three distinct distractor titles drawn from the
/// other steps, shuffled. Fewer than three others yields fewer options.
pub fn generate_answers<R: Rng + ?Sized>(steps: &[LessonStep], correct: &str, rng: &mut R) -> Vec<String> {
  let mut others: Vec<&str> = Vec::with_capacity(steps.len());
  for s in steps {
    if s.title != correct && !others.contains(&s.title.as_str()) {
      others.push(&s.title);
    }
  }
  others.shuffle(rng);

  let mut answers: Vec<String> = others.into_iter().take(DISTRACTORS).map(str::to_string).collect();
  answers.push(correct.to_string());
  answers.shuffle(rng);
  answers
}

/// `min(5, steps.len())` distinct steps, without replacement, in sampled order.
pub fn sample_final_quiz<R: Rng + ?Sized>(steps: &[LessonStep], rng: &mut R) -> Vec<LessonStep> {
  steps
    .choose_multiple(rng, FINAL_QUIZ_QUESTIONS.min(steps.len()))
    .cloned()
    .collect()
}

/// `round(correct / 5 * 100)`, always in `0..=100`.
pub fn score_percentage(correct: usize) -> u32 {
  let clamped = correct.min(FINAL_QUIZ_QUESTIONS) as f64;
  (clamped / FINAL_QUIZ_QUESTIONS as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn steps(titles: &[&str]) -> Vec<LessonStep> {
    titles.iter().map(|t| LessonStep::new(*t, format!("{t}.gif"))).collect()
  }

  #[test]
  fn answers_contain_correct_title_once_plus_three_distractors() {
    let all = steps(&["A", "B", "C", "D", "E", "F"]);
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
      let answers = generate_answers(&all, "C", &mut rng);
      assert_eq!(answers.len(), 4);
      assert_eq!(answers.iter().filter(|a| *a == "C").count(), 1);
      let mut dedup = answers.clone();
      dedup.sort();
      dedup.dedup();
      assert_eq!(dedup.len(), 4, "duplicated option in {answers:?}");
    }
  }

  #[test]
  fn small_lessons_produce_fewer_options() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(generate_answers(&steps(&["A"]), "A", &mut rng), vec!["A".to_string()]);
    let two = generate_answers(&steps(&["A", "B"]), "B", &mut rng);
    assert_eq!(two.len(), 2);
    assert!(two.contains(&"A".to_string()) && two.contains(&"B".to_string()));
  }

  #[test]
  fn repeated_titles_are_not_offered_twice() {
    let all = steps(&["A", "B", "B", "B"]);
    let mut rng = StdRng::seed_from_u64(3);
    let answers = generate_answers(&all, "A", &mut rng);
    assert_eq!(answers.len(), 2);
  }

  #[test]
  fn final_quiz_sample_is_distinct_and_bounded() {
    let mut rng = StdRng::seed_from_u64(11);
    for n in 0..9 {
      let titles: Vec<String> = (0..n).map(|i| format!("S{i}")).collect();
      let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
      let all = steps(&refs);
      let sample = sample_final_quiz(&all, &mut rng);
      assert_eq!(sample.len(), n.min(FINAL_QUIZ_QUESTIONS));
      for s in &sample {
        assert!(all.contains(s));
        assert_eq!(sample.iter().filter(|x| *x == s).count(), 1);
      }
    }
  }

  #[test]
  fn percentage_rounds_over_five_questions() {
    assert_eq!(score_percentage(0), 0);
    assert_eq!(score_percentage(3), 60);
    assert_eq!(score_percentage(5), 100);
    assert_eq!(score_percentage(9), 100);
  }
}
