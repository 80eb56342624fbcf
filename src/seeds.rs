//! Built-in lessons so the service is usable without a TOML lesson bank.

use crate::domain::{Lesson, LessonStep};

fn step(title: &str, media: &str) -> LessonStep {
  LessonStep::new(title, format!("signs/{media}"))
}

pub fn seed_lessons() -> Vec<Lesson> {
  vec![
    Lesson {
      id: "abecedario-1".into(),
      title: "Abecedario: A a F".into(),
      steps: vec![
        step("A", "a.gif"),
        step("B", "b.gif"),
        step("C", "c.gif"),
        step("D", "d.gif"),
        step("E", "e.gif"),
        step("F", "f.gif"),
      ],
    },
    Lesson {
      id: "saludos-1".into(),
      title: "Saludos".into(),
      steps: vec![
        step("Hola", "hola.mp4"),
        step("Buenos días", "buenos_dias.mp4"),
        step("Gracias", "gracias.mp4"),
      ],
    },
    Lesson {
      id: "numeros-1".into(),
      title: "Números del 1 al 5".into(),
      steps: vec![
        step("Uno", "uno.gif"),
        step("Dos", "dos.gif"),
        step("Tres", "tres.gif"),
        step("Cuatro", "cuatro.gif"),
        step("Cinco", "cinco.gif"),
      ],
    },
  ]
}
