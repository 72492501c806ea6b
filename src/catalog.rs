//! Static textbook catalog: unit titles, passages per difficulty, unit quizzes,
//! and the word tables used by the image-guess mission.
//!
//! This guarantees the app is useful without any external content source.

use crate::domain::{Difficulty, QuizQuestion, Unit};

struct UnitDef {
  title: &'static str,
  /// Indexed by `Difficulty::index()`.
  texts: [&'static str; 3],
  quiz: [QuestionDef; 3],
}

struct QuestionDef {
  question: &'static str,
  options: &'static [&'static str],
  answer: usize,
}

macro_rules! q {
  ($q:expr, [$($o:expr),+ $(,)?], $a:expr) => {
    QuestionDef { question: $q, options: &[$($o),+], answer: $a }
  };
}

static UNITS: [UnitDef; 8] = [
  UnitDef {
    title: "Unit 1 - My Lifelogging",
    texts: [
      "Hi! I am Harin. I like to run. I run in the park every day. The air is fresh and nice. I use a running app on my phone. It shows my speed and time. It also counts my steps. Running makes me happy and healthy. Hello! My name is Mike. I love fashion and clothes. I take photos of my outfits every day. Then I post the pictures on social media. Many people like my fashion posts. Hi! I am Elena. I really love donuts. I use a map app to find good shops. Then I go there again with my friends. All three of us record our daily activities. This is called lifelogging. Lifelogging helps us remember good times.",
      "My name is Harin, and running is my favorite hobby. Every morning I jog through the park near my house while a running app records my speed, distance, and steps. Looking at the numbers keeps me motivated. Mike, my classmate, is interested in fashion. He photographs his outfits and posts them on social media, where many followers leave kind comments. Elena has a sweet tooth and loves donuts. She marks her favorite donut shops on a map app and visits them with friends on weekends. The three of us keep records of our daily lives in different ways. This habit is called lifelogging, and it helps us look back on our memories.",
      "Greetings, everyone! I am Harin, and I consider myself a highly active individual with a strong commitment to physical fitness. Each dawn I run through the park, and a tracking application analyzes my pace, distance, and step count so that I can measure steady progress. My friend Mike expresses his creativity through fashion, documenting each outfit and sharing the photographs on social media, where an enthusiastic audience responds. Elena, meanwhile, is devoted to donuts; she curates a personal map of remarkable bakeries and revisits them with companions. Although our interests differ, we all practice lifelogging, the deliberate recording of everyday experiences, which allows us to reflect on cherished moments.",
    ],
    quiz: [
      q!("What is Harin's hobby?", ["Running", "Swimming", "Dancing"], 0),
      q!("What does Mike do on social media?", ["Posts food pictures", "Posts outfit pictures", "Posts travel photos"], 1),
      q!("What does Elena love?", ["Cooking", "Donuts", "Shopping"], 1),
    ],
  },
  UnitDef {
    title: "Unit 2 - Fun School Events Around the World",
    texts: [
      "Schools have fun events all over the world. In New Zealand, students have Cross Country Race Day. They run up hills and through mud. It is hard but fun. In the Philippines, there are about 100 languages. Students celebrate Language Month. They wear traditional clothes and sing songs. In Finland, there is a school concert every spring. I play the violin in the concert. My family comes to watch me. I feel nervous, but I am proud.",
      "Every country has its own special school events. Students in New Zealand look forward to Cross Country Race Day, when they run across hills, fields, and even muddy streams. In the Philippines, where people speak about 100 languages, schools hold Language Month, and students perform songs and dances in traditional clothes. At my school in Finland, we hold a spring concert. I have practiced the violin for months, and although I always feel nervous on stage, my family's cheers make me proud.",
      "School traditions reveal a great deal about the cultures that create them. In New Zealand, Cross Country Race Day challenges students to race over steep hills and through thick mud, building resilience along the way. The Philippines, a nation home to roughly 100 languages, celebrates its linguistic diversity during Language Month, when students present poems and songs in traditional attire. In Finland, my own school hosts an annual spring concert at which I perform on the violin. Despite persistent stage fright, the experience has taught me that preparation transforms anxiety into pride.",
    ],
    quiz: [
      q!("Where is Cross Country Race Day held?", ["Philippines", "New Zealand", "USA"], 1),
      q!("How many languages are there in the Philippines?", ["50", "100", "150"], 1),
      q!("What musical instrument does the student play?", ["Guitar", "Piano", "Violin"], 2),
    ],
  },
  UnitDef {
    title: "Unit 3 - Food and Nutrition",
    texts: [
      "Food is important for our health. We need many kinds of food. Fruit like an apple gives us vitamins. Rice and bread give us energy. Water is also important. We should drink 8 glasses of water every day. Milk and cheese have calcium. Calcium makes our bones strong. Candy and soda taste good, but too much sugar is bad for us. Let's eat well and stay healthy!",
      "Good food is important for a healthy body and mind. A balanced diet includes fruit and vegetables for vitamins, grains such as rice and bread for energy, and fish, eggs, or beans for protein. Doctors say we should drink about 8 glasses of water a day to stay hydrated. Dairy foods like milk and cheese contain calcium, which makes our bones strong. An apple is a better snack than candy, because too much sugar can harm our teeth and health.",
      "Nutrition scientists agree that food is important not only for physical growth but also for concentration and mood. A balanced diet combines vitamin-rich fruit and vegetables, complex carbohydrates from whole grains, and high-quality protein. Hydration matters as much as diet: most experts recommend roughly 8 glasses of water daily. Calcium, found abundantly in dairy products, strengthens bones during the teenage years, when the skeleton develops most rapidly. Replacing sugary snacks with an apple or a handful of nuts is a small decision with long-term benefits.",
    ],
    quiz: [
      q!("What is important for our health?", ["Candy", "Food", "Soda"], 1),
      q!("How much water should we drink daily?", ["4 glasses", "8 glasses", "12 glasses"], 1),
      q!("What makes our bones strong?", ["Sugar", "Calcium", "Salt"], 1),
    ],
  },
  UnitDef {
    title: "Unit 4 - My Family Tradition",
    texts: [
      "Hi, I am Yubin. My mother is from Korea. My father is from India. Our family has special traditions. In spring, we go to the baseball park together. We cheer for our team and eat snacks. After dinner, we play Pachisi. It is a board game from India. My dog sits next to me when we play. I love my family traditions.",
      "My name is Yubin, and my family mixes two cultures. My mother grew up in Korea, while my father comes from India. Every spring, we visit the baseball park to cheer for our favorite team, even when it loses. At home, we have another tradition: after dinner, we play Pachisi, a board game my father played as a child in India. Our dog always watches the game from the sofa. These traditions bring us closer together.",
      "I am Yubin, and my household is a blend of Korean and Indian heritage: my mother was raised in Korea, and my father emigrated from India. Our traditions reflect both backgrounds. Each spring, we attend games at the baseball park, where we cheer passionately regardless of the final score. In the evenings, after dinner, we gather around Pachisi, an ancient Indian board game that my father learned from his grandparents. Even our dog seems to anticipate these gatherings, which remind us that family rituals preserve identity.",
    ],
    quiz: [
      q!("What is Yubin's father's origin?", ["Korea", "India", "Japan"], 1),
      q!("When do they visit the baseball park?", ["Winter", "Spring", "Summer"], 1),
      q!("What game do they play after dinner?", ["Chess", "Pachisi", "Go"], 1),
    ],
  },
  UnitDef {
    title: "Unit 5 - Sports and Physical Activity",
    texts: [
      "I am Minho. I play basketball every Saturday. My team practices at the school gym. Sports are good for our body. Teenagers should exercise for 60 minutes every day. Before exercise, we always warm up. We stretch our arms and legs. After the game, I ride my bicycle home. I feel tired but happy.",
      "Minho plays basketball with his friends every Saturday at the school gym. He believes sports keep his body strong and his mind clear. Health experts say teenagers need about 60 minutes of physical activity every day. Minho's coach always reminds the team to warm up before exercise, stretching their arms and legs to avoid injuries. After practice, Minho rides his bicycle home under the setting sun.",
      "For Minho, Saturday means basketball. He and his teammates train at the school gym, practicing passes and defensive drills for hours. Research suggests that teenagers benefit from roughly 60 minutes of moderate to vigorous physical activity each day, which improves heart health, sleep, and concentration. Minho's coach insists that every session begin with a thorough warm-up, since stretching reduces the risk of injury. Once practice ends, Minho cycles home on his bicycle, exhausted yet satisfied.",
    ],
    quiz: [
      q!("What sport does Minho play every Saturday?", ["Soccer", "Tennis", "Basketball"], 2),
      q!("How long should teenagers exercise each day?", ["30 minutes", "60 minutes", "2 hours"], 1),
      q!("What should you do before exercise?", ["Eat a big meal", "Warm up", "Take a nap"], 1),
    ],
  },
  UnitDef {
    title: "Unit 6 - Hobbies and Leisure Activities",
    texts: [
      "Jisoo loves drawing. She draws her cat and the tree in her yard. Tom grows vegetables on the rooftop of his building. He waters them every morning. Sara collects stamps from many countries. She keeps them in a big book. Hobbies make our free time fun. What is your hobby?",
      "Everyone enjoys free time in a different way. Jisoo spends her weekends drawing; her favorite subjects are her cat and the old tree in her yard. Tom has turned the rooftop of his apartment building into a small garden, where he grows tomatoes and peppers. Sara collects stamps from around the world and organizes them in a thick book by country. Hobbies help us relax and discover new interests.",
      "Leisure activities reveal what truly captures our attention. Jisoo devotes her weekends to drawing, sketching her cat and the gnarled tree in her yard with remarkable patience. Tom transformed the rooftop of his apartment building into a thriving vegetable garden, learning about soil and sunlight through trial and error. Sara, a dedicated collector, has gathered stamps from more than forty countries and catalogs them in an album as thick as a book. Each hobby offers both relaxation and a path to expertise.",
    ],
    quiz: [
      q!("What is Jisoo's hobby?", ["Baking", "Drawing", "Singing"], 1),
      q!("Where does Tom grow vegetables?", ["On the rooftop", "In the school garden", "At the park"], 0),
      q!("What does Sara collect?", ["Stamps", "Coins", "Stickers"], 0),
    ],
  },
  UnitDef {
    title: "Unit 7 - Travel and Exploring the World",
    texts: [
      "Last summer, Hana visited Rome with her family. The sun was hot, but the city was beautiful. They saw old buildings and a big fountain. Hana ate gelato every day. Her favorite was lemon. They walked everywhere on foot. At night, she looked at the moon from the hotel. It was the best trip ever.",
      "Hana traveled to Rome with her family last summer. Although the sun was strong, she loved exploring the ancient streets. They visited the Colosseum and threw coins into a famous fountain. Hana tried gelato every day, and lemon became her favorite flavor. Instead of taking buses, the family explored the city on foot, which let them discover small shops and quiet squares. In the evenings, Hana wrote about her day under the moon.",
      "Last summer, Hana and her family spent a week in Rome, a city where history seems to rise from every street. Despite the intense summer sun, they explored the Colosseum, admired Renaissance churches, and tossed coins into a celebrated fountain. Hana made a point of tasting gelato daily and eventually declared lemon the finest flavor. Choosing to travel on foot rather than by bus, the family stumbled upon hidden courtyards and local bakeries. Each night, beneath the moon, Hana recorded her impressions in a travel journal.",
    ],
    quiz: [
      q!("Which city did Hana visit?", ["Paris", "Rome", "London"], 1),
      q!("What did Hana eat every day?", ["Gelato", "Pizza", "Pasta"], 0),
      q!("How did the family travel around the city?", ["By bus", "On foot", "By bike"], 1),
    ],
  },
  UnitDef {
    title: "Unit 8 - Career and Professional Life",
    texts: [
      "There are many kinds of jobs. Dr. Kim is a vet. She helps sick animals like a dog or a bird. Mr. Park is a game designer. He needs creativity to make new games. What job is good for you? You do not have to decide today. Try many things and find what you love.",
      "People work in many different fields. Dr. Kim is a vet who treats sick animals, from a small bird with a broken wing to a dog with a fever. Mr. Park designs video games, and he says creativity is the most important skill in his job. Both of them say the same thing to students: you do not need to choose your future job right now. Try many things and find what you love.",
      "Career paths are rarely straight lines. Dr. Kim, a vet, spends her days diagnosing and treating animals, whether a bird with an injured wing or a dog recovering from surgery. Mr. Park, a video game designer, argues that creativity outweighs technical skill, because new ideas cannot be copied from a manual. When asked for advice, both professionals offer the same message: there is no need to decide your future today. Try many things, reflect on what energizes you, and find what you love.",
    ],
    quiz: [
      q!("What does Dr. Kim do?", ["Teacher", "Vet", "Chef"], 1),
      q!("What skill does the game designer need most?", ["Creativity", "Speed", "Strength"], 0),
      q!(
        "What advice do they give students?",
        ["Choose the job with the most money", "Decide your job today", "Try many things and find what you love"],
        2
      ),
    ],
  },
];

/// Words the image-guess mission can draw directly.
pub const IMAGE_WORDS: [&str; 15] = [
  "astronaut", "dog", "cat", "tree", "house", "car", "sun", "moon", "flower", "bird", "book", "apple", "hat", "shoes",
  "bicycle",
];

/// (word, semantic-near, spelling-near)
const WORD_DISTRACTORS: [(&str, &str, &str); 15] = [
  ("astronaut", "pilot", "astrology"),
  ("dog", "cat", "log"),
  ("cat", "dog", "hat"),
  ("tree", "flower", "three"),
  ("house", "building", "mouse"),
  ("car", "bus", "bar"),
  ("sun", "star", "son"),
  ("moon", "star", "soon"),
  ("flower", "tree", "flour"),
  ("bird", "butterfly", "beard"),
  ("book", "magazine", "look"),
  ("apple", "banana", "apply"),
  ("hat", "cap", "cat"),
  ("shoes", "boots", "chose"),
  ("bicycle", "motorcycle", "icicle"),
];

/// Used when the target word has no table entry.
pub const GENERIC_DISTRACTORS: (&str, &str, &str) = ("desk", "chair", "window");

pub fn unit_title(unit: Unit) -> &'static str {
  UNITS[unit.index()].title
}

pub fn passage(unit: Unit, difficulty: Difficulty) -> &'static str {
  UNITS[unit.index()].texts[difficulty.index()]
}

pub fn quiz_for(unit: Unit) -> Vec<QuizQuestion> {
  UNITS[unit.index()]
    .quiz
    .iter()
    .map(|q| QuizQuestion {
      question: q.question.to_string(),
      options: q.options.iter().map(|o| o.to_string()).collect(),
      answer: q.answer,
    })
    .collect()
}

/// Built-in (semantic, spelling) pair for a word, if known.
pub fn table_distractors(word: &str) -> Option<(&'static str, &'static str)> {
  let w = word.to_lowercase();
  WORD_DISTRACTORS.iter().find(|(t, _, _)| *t == w).map(|(_, s, sp)| (*s, *sp))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_unit_has_text_and_valid_quiz() {
    for unit in Unit::ALL {
      assert!(unit_title(unit).starts_with(&unit.label()));
      for d in Difficulty::ALL {
        assert!(passage(unit, d).split_whitespace().count() > 30, "{:?}/{:?} too short", unit, d);
      }
      let quiz = quiz_for(unit);
      assert_eq!(quiz.len(), 3);
      for q in &quiz {
        q.validate().unwrap_or_else(|e| panic!("{:?}: {e}", unit));
      }
    }
  }

  #[test]
  fn table_covers_every_image_word() {
    for w in IMAGE_WORDS {
      let (sem, sp) = table_distractors(w).expect("table entry");
      assert_ne!(sem, w);
      assert_ne!(sp, w);
      assert_ne!(sem, sp);
    }
    assert!(table_distractors("spaceship").is_none());
  }
}
